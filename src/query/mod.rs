//! Query AST for aerosearch
//!
//! Chains of query operations built by the fluent surface in
//! [`crate::queryable`]. This module holds data only; the translator turns a
//! chain into the engine's query language.
//!
//! # Shape
//!
//! ```text
//! Take(5) -> Skip(10) -> Sort(name, desc) -> Filter(age > 18) -> Source
//! ```
//!
//! The outermost node is the last operation applied.

mod ast;

pub use ast::{CompareOp, FieldRef, Operand, Predicate, Projection, QueryExpr, SortDirection};

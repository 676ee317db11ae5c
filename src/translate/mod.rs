//! Expression translator subsystem
//!
//! Turns a query chain into a `CompiledQuery`: an engine filter expression,
//! sort key, pagination bounds, projected fields and the track-total flag.
//!
//! # Predicate mapping
//!
//! | Predicate            | Engine clause                          |
//! |----------------------|----------------------------------------|
//! | `f == v`             | `term`                                 |
//! | `f != v`             | `bool.must_not[term]`                  |
//! | `f > v` (and kin)    | `range`, bound stringified             |
//! | `contains(f, v)`     | `match`                                |
//! | `!p`                 | `bool.must_not[p]`                     |
//! | `l && r`             | `bool.must[l, r]`                      |
//! | `l \|\| r`           | `bool.should[l, r]`, minimum match 1   |
//!
//! No I/O happens here.

mod compiled;
mod errors;
mod translator;

pub use compiled::{CompiledFilter, CompiledQuery, SortSpec};
pub use errors::{TranslateError, TranslateResult};
pub use translator::Translator;

use crate::query::QueryExpr;

/// Translates a query chain. Shorthand for [`Translator::translate`].
pub fn translate(expr: &QueryExpr) -> TranslateResult<CompiledQuery> {
    Translator::translate(expr)
}

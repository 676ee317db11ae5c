//! # Queryable
//!
//! Fluent, deferred query building on top of a [`QueryProvider`](crate::provider::QueryProvider).
//!
//! ```ignore
//! let adults = users
//!     .filter(Predicate::gt("age", 18))
//!     .order_by_descending("name")
//!     .skip(10)
//!     .take(5);
//!
//! let page = adults.to_vec()?;                       // one request
//! let mut stream = adults.stream(cancel.clone());    // request sent on first poll
//! ```

#[allow(clippy::module_inception)]
mod queryable;
mod stream;

pub use queryable::Queryable;
pub use stream::AsyncResults;

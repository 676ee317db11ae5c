//! # Query Provider
//!
//! Turns a query chain into one engine request and materializes the answer.
//!
//! ```ignore
//! let provider: QueryProvider<User> = QueryProvider::new(transport, "users", metrics);
//! let expr = QueryExpr::source().filter(Predicate::eq("status", "active")).count();
//! let active = provider.execute(&expr, None)?.into_count()?;
//! ```

mod errors;
mod output;
#[allow(clippy::module_inception)]
mod provider;

pub use errors::{QueryError, QueryResult};
pub use output::QueryOutput;
pub use provider::QueryProvider;

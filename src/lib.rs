//! aerosearch - deferred query translation for document search engines
//!
//! Query chains are built as immutable expression trees, compiled into the
//! engine's query DSL and executed through a pluggable transport.

pub mod aggregation;
pub mod cli;
pub mod config;
pub mod context;
pub mod observability;
pub mod provider;
pub mod query;
pub mod queryable;
pub mod translate;
pub mod transport;

pub use aggregation::AggregationSpec;
pub use config::SearchConfig;
pub use context::{ChangeSet, Document, IndexMapping, PendingChange, SearchContext};
pub use provider::{QueryError, QueryOutput, QueryProvider, QueryResult};
pub use query::{Predicate, Projection, QueryExpr, SortDirection};
pub use queryable::{AsyncResults, Queryable};
pub use translate::{CompiledFilter, CompiledQuery, TranslateError};
pub use transport::{CancellationToken, MemoryTransport, SearchTransport};

//! Aggregations
//!
//! Server-side summaries over the documents a query matches. A query with an
//! aggregation is sent with page size zero; only the summary comes back.

mod result;
mod spec;

pub use result::{decode_aggregations, Bucket, MetricValue, TermsBuckets};
pub use spec::AggregationSpec;

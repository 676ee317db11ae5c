//! Observability subsystem
//!
//! - Structured logging (JSON lines routed through `tracing`)
//! - Deterministic counters
//!
//! Observability is read-only: nothing here influences query results.
//!
//! ```ignore
//! use aerosearch::observability::{Event, Logger, MetricsRegistry};
//!
//! Logger::event(Event::QueryExecuted, &[("index", "users"), ("hits", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_queries_executed();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

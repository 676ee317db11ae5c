//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by providers and contexts
///
/// Uses Relaxed ordering; each counter is independent.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Queries answered with a valid response
    queries_executed: AtomicU64,
    /// Queries that failed translation
    queries_rejected: AtomicU64,
    /// Queries answered with an invalid response or a transport fault
    queries_failed: AtomicU64,
    /// Documents materialized across all queries
    documents_returned: AtomicU64,
    /// Changes accepted by the engine
    changes_applied: AtomicU64,
    /// Changes answered with an invalid response
    changes_rejected: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_documents_returned(&self, count: u64) {
        self.documents_returned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_changes_applied(&self) {
        self.changes_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_changes_rejected(&self) {
        self.changes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            documents_returned: self.documents_returned.load(Ordering::Relaxed),
            changes_applied: self.changes_applied.load(Ordering::Relaxed),
            changes_rejected: self.changes_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub queries_failed: u64,
    pub documents_returned: u64,
    pub changes_applied: u64,
    pub changes_rejected: u64,
}

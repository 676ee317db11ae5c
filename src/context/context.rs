//! Search context
//!
//! Entry point for application code: hands out queryables per entity type
//! and replays change batches against the engine.

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::observability::MetricsRegistry;
use crate::provider::{QueryError, QueryProvider, QueryResult};
use crate::queryable::Queryable;
use crate::transport::{CancellationToken, SearchTransport};

use super::mapping::{Document, IndexMapping, IndexMappingBuilder};
use super::replay::{self, ChangeSet};

/// Shared handle over one engine and one index mapping
#[derive(Clone)]
pub struct SearchContext {
    transport: Arc<dyn SearchTransport>,
    mapping: Arc<IndexMapping>,
    metrics: Arc<MetricsRegistry>,
}

impl SearchContext {
    pub fn new(transport: Arc<dyn SearchTransport>, mapping: IndexMapping) -> Self {
        Self {
            transport,
            mapping: Arc::new(mapping),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Builds the mapping with the configured prefix and overrides applied
    pub fn from_config(
        transport: Arc<dyn SearchTransport>,
        registrations: IndexMappingBuilder,
        config: &SearchConfig,
    ) -> Self {
        Self::new(transport, registrations.with_config(config).build())
    }

    /// Shares counters with other contexts or providers
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn transport(&self) -> &Arc<dyn SearchTransport> {
        &self.transport
    }

    /// Queryable over every `T` document, or `UnmappedEntity`
    pub fn set<T: Document>(&self) -> QueryResult<Queryable<T>> {
        let index = self
            .mapping
            .index_of::<T>()
            .ok_or_else(|| QueryError::UnmappedEntity(T::KIND.to_string()))?;

        let provider = QueryProvider::new(
            Arc::clone(&self.transport),
            index,
            Arc::clone(&self.metrics),
        );
        Ok(Queryable::new(Arc::new(provider)))
    }

    /// Applies `changes` in order; returns the number the engine accepted
    pub async fn save_changes(
        &self,
        changes: &ChangeSet,
        cancel: &CancellationToken,
    ) -> QueryResult<usize> {
        replay::replay(&self.transport, &self.mapping, &self.metrics, changes, cancel).await
    }
}

impl std::fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("mapping", &self.mapping)
            .finish()
    }
}

//! Query provider
//!
//! Executes query chains against one index:
//! 1. translate the chain (rejections never reach the network)
//! 2. build the search request; an external filter replaces the translated one
//! 3. send it, blocking or async
//! 4. an invalid response fails with the engine's diagnostic, no retries
//! 5. materialize a count or typed documents
//!
//! Nothing is cached: every execution is one transport call.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::aggregation::{decode_aggregations, AggregationSpec};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::query::QueryExpr;
use crate::translate::{CompiledFilter, CompiledQuery, Translator};
use crate::transport::{CancellationToken, SearchRequest, SearchResponse, SearchTransport};

use super::errors::{QueryError, QueryResult};
use super::output::QueryOutput;

/// Executes chains for element type `T` against one index
pub struct QueryProvider<T> {
    transport: Arc<dyn SearchTransport>,
    index: String,
    metrics: Arc<MetricsRegistry>,
    _element: PhantomData<fn() -> T>,
}

impl<T> QueryProvider<T> {
    pub fn new(
        transport: Arc<dyn SearchTransport>,
        index: impl Into<String>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            transport,
            index: index.into(),
            metrics,
            _element: PhantomData,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Same transport and index, different element type.
    /// Used once a projection changes what each hit decodes into.
    pub fn retarget<U>(&self) -> QueryProvider<U> {
        QueryProvider {
            transport: Arc::clone(&self.transport),
            index: self.index.clone(),
            metrics: Arc::clone(&self.metrics),
            _element: PhantomData,
        }
    }

    /// Builds the request a chain would send, without sending it.
    ///
    /// `aggregations` are attached next to the filter, paging, sort and
    /// projection of the chain.
    pub fn request_for(
        &self,
        expr: &QueryExpr,
        external: Option<&CompiledFilter>,
        aggregations: Option<&AggregationSpec>,
    ) -> QueryResult<SearchRequest> {
        let compiled = self.compile(expr)?;
        let mut request = self.search_request(&compiled, external);
        request.aggregations = aggregations.cloned();
        Ok(request)
    }

    /// Compiled request body as engine JSON. No network call.
    pub fn query_string(
        &self,
        expr: &QueryExpr,
        external: Option<&CompiledFilter>,
        aggregations: Option<&AggregationSpec>,
    ) -> QueryResult<String> {
        self.request_for(expr, external, aggregations)
            .map(|request| request.to_wire_string())
    }

    fn compile(&self, expr: &QueryExpr) -> QueryResult<CompiledQuery> {
        match Translator::translate(expr) {
            Ok(compiled) => {
                Logger::event(
                    Event::QueryTranslated,
                    &[("index", self.index.as_str()), ("root", expr.op_name())],
                );
                Ok(compiled)
            }
            Err(err) => {
                self.metrics.increment_queries_rejected();
                Logger::event(
                    Event::QueryRejected,
                    &[
                        ("code", err.code()),
                        ("index", self.index.as_str()),
                        ("reason", err.to_string().as_str()),
                    ],
                );
                Err(err.into())
            }
        }
    }

    fn search_request(
        &self,
        compiled: &CompiledQuery,
        external: Option<&CompiledFilter>,
    ) -> SearchRequest {
        let mut request = SearchRequest::new(self.index.clone());
        request.query = external.cloned().or_else(|| compiled.filter.clone());
        request.track_total_hits = compiled.track_total;

        if compiled.is_count() {
            // Only the total is needed; skip/take are applied to it afterwards
            request.size = Some(0);
            return request;
        }

        request.from = compiled.skip;
        request.size = compiled.take;
        request.sort = compiled.sort.iter().cloned().collect();
        request.source_includes = compiled.projected_fields.clone();
        request
    }

    fn aggregation_request(
        &self,
        compiled: &CompiledQuery,
        external: Option<&CompiledFilter>,
        spec: &AggregationSpec,
    ) -> SearchRequest {
        let mut request = SearchRequest::new(self.index.clone());
        request.query = external.cloned().or_else(|| compiled.filter.clone());
        request.size = Some(0);
        request.aggregations = Some(spec.clone());
        request
    }

    async fn send_async(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> QueryResult<SearchResponse> {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(QueryError::Cancelled),
            result = self.transport.search_async(request, cancel) => result.map_err(QueryError::from),
        };

        // A transport that noticed the token itself reports a fault; surface it as cancellation
        let outcome = match outcome {
            Err(QueryError::Transport(_)) if cancel.is_cancelled() => Err(QueryError::Cancelled),
            other => other,
        };

        if outcome.is_err() {
            self.metrics.increment_queries_failed();
        }
        outcome
    }

    fn send(&self, request: &SearchRequest) -> QueryResult<SearchResponse> {
        self.transport.search(request).map_err(|err| {
            self.metrics.increment_queries_failed();
            QueryError::from(err)
        })
    }

    fn check_valid(&self, response: SearchResponse) -> QueryResult<SearchResponse> {
        if response.is_valid {
            return Ok(response);
        }
        self.metrics.increment_queries_failed();
        Logger::event(
            Event::QueryRemoteFailed,
            &[
                ("diagnostic", response.debug_information.as_str()),
                ("index", self.index.as_str()),
            ],
        );
        Err(QueryError::remote(response.debug_information))
    }
}

impl<T: DeserializeOwned> QueryProvider<T> {
    /// Executes a chain, blocking on the transport
    pub fn execute(
        &self,
        expr: &QueryExpr,
        external: Option<&CompiledFilter>,
    ) -> QueryResult<QueryOutput<T>> {
        let compiled = self.compile(expr)?;
        let request = self.search_request(&compiled, external);
        let response = self.send(&request)?;
        self.materialize(&compiled, response)
    }

    /// Executes a chain without blocking. Returns `Cancelled` if `cancel`
    /// fires before the response arrives.
    pub async fn execute_async(
        &self,
        expr: &QueryExpr,
        external: Option<&CompiledFilter>,
        cancel: &CancellationToken,
    ) -> QueryResult<QueryOutput<T>> {
        let compiled = self.compile(expr)?;
        let request = self.search_request(&compiled, external);
        let response = self.send_async(&request, cancel).await?;
        self.materialize(&compiled, response)
    }

    /// Runs `spec` over the documents the chain's filter selects and
    /// decodes the named results into `R` by field name.
    /// Sort, paging and projection do not apply.
    pub async fn aggregate<R: DeserializeOwned + Default>(
        &self,
        expr: &QueryExpr,
        external: Option<&CompiledFilter>,
        spec: &AggregationSpec,
        cancel: &CancellationToken,
    ) -> QueryResult<R> {
        let compiled = self.compile(expr)?;
        let request = self.aggregation_request(&compiled, external, spec);
        let response = self.send_async(&request, cancel).await?;
        let response = self.check_valid(response)?;

        let decoded = decode_aggregations(response.aggregations)?;
        self.metrics.increment_queries_executed();
        Logger::event(
            Event::QueryExecuted,
            &[
                ("aggregations", spec.len().to_string().as_str()),
                ("index", self.index.as_str()),
                ("total", response.total.to_string().as_str()),
            ],
        );
        Ok(decoded)
    }

    fn materialize(
        &self,
        compiled: &CompiledQuery,
        response: SearchResponse,
    ) -> QueryResult<QueryOutput<T>> {
        let response = self.check_valid(response)?;

        if compiled.track_total {
            let count = window_count(response.total, compiled.skip, compiled.take);
            self.metrics.increment_queries_executed();
            Logger::event(
                Event::QueryExecuted,
                &[("count", count.to_string().as_str()), ("index", self.index.as_str())],
            );
            return Ok(QueryOutput::Count(count));
        }

        let documents = response
            .documents
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;

        self.metrics.increment_queries_executed();
        self.metrics.add_documents_returned(documents.len() as u64);
        Logger::event(
            Event::QueryExecuted,
            &[
                ("hits", documents.len().to_string().as_str()),
                ("index", self.index.as_str()),
                ("total", response.total.to_string().as_str()),
            ],
        );
        Ok(QueryOutput::Documents(documents))
    }
}

impl<T> Clone for QueryProvider<T> {
    fn clone(&self) -> Self {
        self.retarget()
    }
}

impl<T> std::fmt::Debug for QueryProvider<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryProvider")
            .field("index", &self.index)
            .finish()
    }
}

/// Applies a chain's skip/take to the engine's total hit count
fn window_count(total: i64, skip: Option<u64>, take: Option<u64>) -> i64 {
    let skip = skip.map_or(0, |s| i64::try_from(s).unwrap_or(i64::MAX));
    let remaining = total.saturating_sub(skip).max(0);
    match take {
        Some(take) => remaining.min(i64::try_from(take).unwrap_or(i64::MAX)),
        None => remaining,
    }
}

//! Composable query facade
//!
//! Each builder call returns a new `Queryable` holding a longer chain;
//! the original is untouched and nothing runs until a terminal is called.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::aggregation::AggregationSpec;
use crate::provider::{QueryProvider, QueryResult};
use crate::query::{FieldRef, Predicate, Projection, QueryExpr, SortDirection};
use crate::translate::CompiledFilter;
use crate::transport::CancellationToken;

use super::stream::AsyncResults;

/// A deferred query over documents of type `T`
pub struct Queryable<T> {
    provider: Arc<QueryProvider<T>>,
    expr: Arc<QueryExpr>,
    external: Option<CompiledFilter>,
    aggregations: Option<AggregationSpec>,
}

impl<T> Queryable<T> {
    /// A queryable over every document in the provider's index
    pub fn new(provider: Arc<QueryProvider<T>>) -> Self {
        Self::from_parts(provider, QueryExpr::source())
    }

    pub fn from_parts(provider: Arc<QueryProvider<T>>, expr: Arc<QueryExpr>) -> Self {
        Self {
            provider,
            expr,
            external: None,
            aggregations: None,
        }
    }

    pub fn expression(&self) -> &Arc<QueryExpr> {
        &self.expr
    }

    pub fn provider(&self) -> &Arc<QueryProvider<T>> {
        &self.provider
    }

    pub fn external_query(&self) -> Option<&CompiledFilter> {
        self.external.as_ref()
    }

    pub fn aggregations(&self) -> Option<&AggregationSpec> {
        self.aggregations.as_ref()
    }

    fn chain(&self, expr: Arc<QueryExpr>) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            expr,
            external: self.external.clone(),
            aggregations: self.aggregations.clone(),
        }
    }

    pub fn filter(&self, predicate: Predicate) -> Self {
        self.chain(self.expr.filter(predicate))
    }

    pub fn order_by(&self, field: impl Into<FieldRef>) -> Self {
        self.chain(self.expr.sort(field, SortDirection::Asc))
    }

    pub fn order_by_descending(&self, field: impl Into<FieldRef>) -> Self {
        self.chain(self.expr.sort(field, SortDirection::Desc))
    }

    pub fn skip(&self, count: i64) -> Self {
        self.chain(self.expr.skip(count))
    }

    pub fn take(&self, count: i64) -> Self {
        self.chain(self.expr.take(count))
    }

    /// Keeps only `fields` of each hit; results decode into `U`
    pub fn select<U, I>(&self, fields: I) -> Queryable<U>
    where
        I: IntoIterator,
        I::Item: Into<FieldRef>,
    {
        let projection = Projection::Object(fields.into_iter().map(Into::into).collect());
        self.select_with(projection)
    }

    /// Applies any projection shape. Shapes the engine cannot express are
    /// rejected when the query runs.
    pub fn select_with<U>(&self, projection: Projection) -> Queryable<U> {
        Queryable {
            provider: Arc::new(self.provider.retarget()),
            expr: self.expr.project(projection),
            external: self.external.clone(),
            aggregations: self.aggregations.clone(),
        }
    }

    /// Always rejected at execution; the engine has no grouping
    pub fn group_by(&self, key: impl Into<FieldRef>) -> Self {
        self.chain(self.expr.group_by(key))
    }

    /// Replaces the translated filter with a hand-built one
    pub fn with_query(&self, filter: CompiledFilter) -> Self {
        let mut next = self.chain(Arc::clone(&self.expr));
        next.external = Some(filter);
        next
    }

    /// Attaches aggregations rendered by [`query_string`](Self::query_string)
    pub fn with_aggregations(&self, spec: AggregationSpec) -> Self {
        let mut next = self.chain(Arc::clone(&self.expr));
        next.aggregations = Some(spec);
        next
    }

    /// Request body this queryable would send. No network call.
    pub fn query_string(&self) -> QueryResult<String> {
        self.provider
            .query_string(&self.expr, self.external.as_ref(), self.aggregations.as_ref())
    }
}

impl<T: DeserializeOwned> Queryable<T> {
    /// Executes now. Each call is a fresh request.
    pub fn to_vec(&self) -> QueryResult<Vec<T>> {
        self.provider
            .execute(&self.expr, self.external.as_ref())?
            .into_documents()
    }

    /// Executes now and iterates the materialized results
    pub fn iter(&self) -> QueryResult<std::vec::IntoIter<T>> {
        self.to_vec().map(Vec::into_iter)
    }

    pub async fn to_vec_async(&self, cancel: &CancellationToken) -> QueryResult<Vec<T>> {
        self.provider
            .execute_async(&self.expr, self.external.as_ref(), cancel)
            .await?
            .into_documents()
    }

    /// Number of matching documents after skip/take
    pub fn count(&self) -> QueryResult<i64> {
        self.provider
            .execute(&self.expr.count(), self.external.as_ref())?
            .into_count()
    }

    pub async fn count_async(&self, cancel: &CancellationToken) -> QueryResult<i64> {
        self.provider
            .execute_async(&self.expr.count(), self.external.as_ref(), cancel)
            .await?
            .into_count()
    }

    /// Runs `spec` over the documents this queryable's filter selects
    pub async fn aggregate<R: DeserializeOwned + Default>(
        &self,
        spec: &AggregationSpec,
        cancel: &CancellationToken,
    ) -> QueryResult<R> {
        self.provider
            .aggregate(&self.expr, self.external.as_ref(), spec, cancel)
            .await
    }
}

impl<T: DeserializeOwned + Send + 'static> Queryable<T> {
    /// Lazily submitted stream; the request goes out on the first poll
    pub fn stream(&self, cancel: CancellationToken) -> AsyncResults<T> {
        AsyncResults::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.expr),
            self.external.clone(),
            cancel,
        )
    }
}

impl<T> Clone for Queryable<T> {
    fn clone(&self) -> Self {
        self.chain(Arc::clone(&self.expr))
    }
}

impl<T> fmt::Debug for Queryable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queryable")
            .field("index", &self.provider.index())
            .field("expr", &self.expr)
            .field("external", &self.external)
            .finish()
    }
}

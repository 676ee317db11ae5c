//! RPC boundary to the search engine
//!
//! Implementations own connection handling, wire serialization, retries and
//! timeouts. Everything above this trait treats it as opaque.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::cancel::CancellationToken;
use super::errors::TransportResult;
use super::request::{SearchRequest, SearchResponse, WriteResponse};

/// Boxed future returned by async transport calls
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Search engine client.
///
/// Shared read-only between all providers; must be safe for concurrent use.
pub trait SearchTransport: Send + Sync {
    /// Blocking search
    fn search(&self, request: &SearchRequest) -> TransportResult<SearchResponse>;

    /// Non-blocking search. Implementations should stop waiting once
    /// `cancel` fires; callers also race the returned future against it.
    /// The same holds for the document writes below.
    fn search_async<'a>(
        &'a self,
        request: &'a SearchRequest,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, SearchResponse>;

    /// Index (create or replace) one document
    fn index_document<'a>(
        &'a self,
        index: &'a str,
        id: &'a str,
        document: &'a Value,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, WriteResponse>;

    /// Partial update of one existing document
    fn update_document<'a>(
        &'a self,
        index: &'a str,
        id: &'a str,
        document: &'a Value,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, WriteResponse>;

    /// Delete one document
    fn delete_document<'a>(
        &'a self,
        index: &'a str,
        id: &'a str,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, WriteResponse>;
}

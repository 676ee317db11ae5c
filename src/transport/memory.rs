//! In-memory search engine
//!
//! Implements [`SearchTransport`] over documents held in process. Used as
//! the test double and by the offline CLI. Supports scripted faults and
//! rejected writes so callers can exercise failure paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;

use super::cancel::CancellationToken;
use super::client::{SearchTransport, TransportFuture};
use super::errors::{TransportError, TransportResult};
use super::evaluate::{self, DocumentSorter, FilterEvaluator};
use super::request::{SearchRequest, SearchResponse, WriteResponse};

/// Page size used when a request carries no `size`
pub const DEFAULT_PAGE_SIZE: u64 = 10;

type Index = Vec<(String, Value)>;

fn poisoned<T>(_: PoisonError<T>) -> TransportError {
    TransportError::Protocol("Lock poisoned".to_string())
}

/// Search engine backed by process memory
#[derive(Debug, Default)]
pub struct MemoryTransport {
    indices: RwLock<BTreeMap<String, Index>>,
    rejected_ids: RwLock<BTreeSet<String>>,
    next_fault: Mutex<Option<TransportError>>,
    next_invalid: Mutex<Option<String>>,
    last_request: Mutex<Option<SearchRequest>>,
    latency: Option<Duration>,
    search_calls: AtomicU64,
    write_calls: AtomicU64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every async call. Lets tests cancel an in-flight request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Creates an empty index
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.indices
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(index.into())
            .or_default();
        self
    }

    /// Loads documents into an index, creating it if needed
    pub fn with_documents<I, S>(mut self, index: impl Into<String>, documents: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let entries = self
            .indices
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(index.into())
            .or_default();
        for (id, document) in documents {
            upsert(entries, id.into(), document);
        }
        self
    }

    /// Inserts or replaces one document
    pub fn insert_document(
        &self,
        index: &str,
        id: impl Into<String>,
        document: Value,
    ) -> TransportResult<()> {
        let mut indices = self.indices.write().map_err(poisoned)?;
        upsert(
            indices.entry(index.to_string()).or_default(),
            id.into(),
            document,
        );
        Ok(())
    }

    /// All documents of an index in insertion order
    pub fn documents(&self, index: &str) -> TransportResult<Vec<Value>> {
        let indices = self.indices.read().map_err(poisoned)?;
        Ok(indices
            .get(index)
            .map(|docs| docs.iter().map(|(_, d)| d.clone()).collect())
            .unwrap_or_default())
    }

    pub fn document(&self, index: &str, id: &str) -> TransportResult<Option<Value>> {
        let indices = self.indices.read().map_err(poisoned)?;
        Ok(indices
            .get(index)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, d)| d.clone()))
    }

    /// Writes touching `id` will be answered with an invalid response
    pub fn reject_id(&self, id: impl Into<String>) -> TransportResult<()> {
        self.rejected_ids.write().map_err(poisoned)?.insert(id.into());
        Ok(())
    }

    /// The next call of any kind fails with `fault`
    pub fn fail_next(&self, fault: TransportError) -> TransportResult<()> {
        *self.next_fault.lock().map_err(poisoned)? = Some(fault);
        Ok(())
    }

    /// The next search is answered with an invalid response
    pub fn invalid_next_search(&self, diagnostic: impl Into<String>) -> TransportResult<()> {
        *self.next_invalid.lock().map_err(poisoned)? = Some(diagnostic.into());
        Ok(())
    }

    pub fn search_calls(&self) -> u64 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Most recent search request received
    pub fn last_request(&self) -> Option<SearchRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn take_fault(&self) -> TransportResult<()> {
        match self.next_fault.lock().map_err(poisoned)?.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn run_search(&self, request: &SearchRequest) -> TransportResult<SearchResponse> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().map_err(poisoned)? = Some(request.clone());
        self.take_fault()?;

        if let Some(diagnostic) = self.next_invalid.lock().map_err(poisoned)?.take() {
            return Ok(SearchResponse::invalid(diagnostic));
        }

        let indices = self.indices.read().map_err(poisoned)?;
        let Some(entries) = indices.get(&request.index) else {
            return Ok(SearchResponse::invalid(format!(
                "index_not_found_exception: no such index [{}]",
                request.index
            )));
        };

        let mut matched: Vec<Value> = entries
            .iter()
            .map(|(_, doc)| doc)
            .filter(|doc| FilterEvaluator::matches(doc, request.query.as_ref()))
            .cloned()
            .collect();
        drop(indices);

        let total = matched.len() as i64;

        let aggregations = match &request.aggregations {
            Some(spec) => match evaluate::aggregate(&matched, spec) {
                Ok(out) => Some(out),
                Err(reason) => return Ok(SearchResponse::invalid(reason)),
            },
            None => None,
        };

        // Stable sorts applied last key first leave the first key primary
        for spec in request.sort.iter().rev() {
            DocumentSorter::sort(&mut matched, spec);
        }

        let from = request.from.unwrap_or(0) as usize;
        let size = request.size.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
        let page: Vec<Value> = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|doc| evaluate::project(doc, &request.source_includes))
            .collect();

        let response = SearchResponse::valid(page, total);
        Ok(match aggregations {
            Some(out) => response.with_aggregations(out),
            None => response,
        })
    }

    fn run_write<F>(&self, index: &str, id: &str, apply: F) -> TransportResult<WriteResponse>
    where
        F: FnOnce(&mut Index) -> Result<(), String>,
    {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_fault()?;

        if self.rejected_ids.read().map_err(poisoned)?.contains(id) {
            return Ok(WriteResponse::invalid(format!(
                "document [{}] rejected by engine",
                id
            )));
        }

        let mut indices = self.indices.write().map_err(poisoned)?;
        let entries = indices.entry(index.to_string()).or_default();
        Ok(match apply(entries) {
            Ok(()) => WriteResponse::valid(),
            Err(reason) => WriteResponse::invalid(reason),
        })
    }

    async fn delay(&self, cancel: &CancellationToken) -> TransportResult<()> {
        let Some(latency) = self.latency else {
            return Ok(());
        };
        tokio::select! {
            _ = tokio::time::sleep(latency) => Ok(()),
            _ = cancel.cancelled() => Err(TransportError::Connection("request aborted".to_string())),
        }
    }
}

fn upsert(entries: &mut Index, id: String, document: Value) {
    match entries.iter_mut().find(|(doc_id, _)| *doc_id == id) {
        Some(existing) => existing.1 = document,
        None => entries.push((id, document)),
    }
}

impl SearchTransport for MemoryTransport {
    fn search(&self, request: &SearchRequest) -> TransportResult<SearchResponse> {
        self.run_search(request)
    }

    fn search_async<'a>(
        &'a self,
        request: &'a SearchRequest,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, SearchResponse> {
        Box::pin(async move {
            self.delay(cancel).await?;
            self.run_search(request)
        })
    }

    fn index_document<'a>(
        &'a self,
        index: &'a str,
        id: &'a str,
        document: &'a Value,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, WriteResponse> {
        Box::pin(async move {
            self.delay(cancel).await?;
            self.run_write(index, id, |entries| {
                upsert(entries, id.to_string(), document.clone());
                Ok(())
            })
        })
    }

    fn update_document<'a>(
        &'a self,
        index: &'a str,
        id: &'a str,
        document: &'a Value,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, WriteResponse> {
        Box::pin(async move {
            self.delay(cancel).await?;
            self.run_write(index, id, |entries| {
                let (_, existing) = entries
                    .iter_mut()
                    .find(|(doc_id, _)| doc_id == id)
                    .ok_or_else(|| format!("document_missing_exception: [{}]", id))?;
                match (existing, document) {
                    (Value::Object(current), Value::Object(partial)) => {
                        for (key, value) in partial {
                            current.insert(key.clone(), value.clone());
                        }
                    }
                    (current, replacement) => *current = replacement.clone(),
                }
                Ok(())
            })
        })
    }

    fn delete_document<'a>(
        &'a self,
        index: &'a str,
        id: &'a str,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, WriteResponse> {
        Box::pin(async move {
            self.delay(cancel).await?;
            self.run_write(index, id, |entries| {
                let before = entries.len();
                entries.retain(|(doc_id, _)| doc_id != id);
                if entries.len() == before {
                    Err(format!("not_found: [{}]", id))
                } else {
                    Ok(())
                }
            })
        })
    }
}

//! Async iteration over query results
//!
//! The fetch is created on the first poll, never at construction, and at
//! most once per stream. A failed fetch is yielded as one `Err` item and
//! the stream then ends.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::de::DeserializeOwned;

use crate::provider::{QueryProvider, QueryResult};
use crate::query::QueryExpr;
use crate::translate::CompiledFilter;
use crate::transport::CancellationToken;

type Fetch<T> = Pin<Box<dyn Future<Output = QueryResult<Vec<T>>> + Send>>;

enum State<T> {
    NotStarted,
    Awaiting(Fetch<T>),
    Iterating(std::vec::IntoIter<T>),
    Done,
}

/// Stream of documents produced by one lazily submitted query
pub struct AsyncResults<T> {
    provider: Arc<QueryProvider<T>>,
    expr: Arc<QueryExpr>,
    external: Option<CompiledFilter>,
    cancel: CancellationToken,
    state: State<T>,
}

// No field is ever pinned in place; the fetch future is boxed.
impl<T> Unpin for AsyncResults<T> {}

impl<T> AsyncResults<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(
        provider: Arc<QueryProvider<T>>,
        expr: Arc<QueryExpr>,
        external: Option<CompiledFilter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            expr,
            external,
            cancel,
            state: State::NotStarted,
        }
    }

    /// True once the first poll has submitted the query
    pub fn is_started(&self) -> bool {
        !matches!(self.state, State::NotStarted)
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Releases buffered results and any pending fetch. The stream ends.
    /// A request the engine already answered is not affected.
    pub fn close(&mut self) {
        self.state = State::Done;
    }

    fn start_fetch(&self) -> Fetch<T> {
        let provider = Arc::clone(&self.provider);
        let expr = Arc::clone(&self.expr);
        let external = self.external.clone();
        let cancel = self.cancel.clone();

        Box::pin(async move {
            provider
                .execute_async(&expr, external.as_ref(), &cancel)
                .await?
                .into_documents()
        })
    }
}

impl<T> Stream for AsyncResults<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Item = QueryResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                State::NotStarted => {
                    this.state = State::Awaiting(this.start_fetch());
                }
                State::Awaiting(fetch) => match fetch.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(documents)) => {
                        this.state = State::Iterating(documents.into_iter());
                    }
                    Poll::Ready(Err(err)) => {
                        this.state = State::Done;
                        return Poll::Ready(Some(Err(err)));
                    }
                },
                State::Iterating(items) => match items.next() {
                    Some(item) => return Poll::Ready(Some(Ok(item))),
                    None => this.state = State::Done,
                },
                State::Done => return Poll::Ready(None),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.state {
            State::Iterating(items) => items.size_hint(),
            State::Done => (0, Some(0)),
            _ => (0, None),
        }
    }
}

impl<T> fmt::Debug for AsyncResults<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::NotStarted => "not_started",
            State::Awaiting(_) => "awaiting",
            State::Iterating(_) => "iterating",
            State::Done => "done",
        };
        f.debug_struct("AsyncResults")
            .field("index", &self.provider.index())
            .field("state", &state)
            .finish()
    }
}

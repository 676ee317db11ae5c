//! # Transport
//!
//! The RPC boundary to the search engine. Requests and responses are
//! structured values; [`SearchTransport`] is the only seam the rest of the
//! crate talks through. [`MemoryTransport`] evaluates requests in process.

mod cancel;
mod client;
mod errors;
mod evaluate;
mod memory;
mod request;

pub use cancel::CancellationToken;
pub use client::{SearchTransport, TransportFuture};
pub use errors::{TransportError, TransportResult};
pub use memory::{MemoryTransport, DEFAULT_PAGE_SIZE};
pub use request::{SearchRequest, SearchResponse, WriteResponse};

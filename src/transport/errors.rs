//! # Transport Errors
//!
//! Faults raised by the RPC boundary itself. These surface to callers
//! unmodified; this crate adds no retry or backoff.

use thiserror::Error;

/// Result type for transport calls
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-level faults
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Connection(_) => "AERO_TRANSPORT_CONNECTION",
            TransportError::Timeout(_) => "AERO_TRANSPORT_TIMEOUT",
            TransportError::Protocol(_) => "AERO_TRANSPORT_PROTOCOL",
        }
    }
}

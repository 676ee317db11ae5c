//! Query execution errors
//!
//! Error codes:
//! - AERO_QUERY_UNSUPPORTED / AERO_QUERY_INVALID (from translation)
//! - AERO_REMOTE_QUERY_FAILED
//! - AERO_UNMAPPED_ENTITY
//! - AERO_TRANSPORT_* (from the transport, unmodified)
//! - AERO_QUERY_CANCELLED
//! - AERO_DECODE_FAILED
//! - AERO_UNEXPECTED_SHAPE

use thiserror::Error;

use crate::transport::TransportError;
use crate::translate::TranslateError;

/// Result type for query execution and change replay
pub type QueryResult<T> = Result<T, QueryError>;

/// Every failure aborts the current call; nothing is partially returned
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    /// Engine answered with an invalid response
    #[error("Remote query failed: {diagnostic}")]
    Remote { diagnostic: String },

    /// No index is registered for the entity kind
    #[error("No index mapped for entity kind '{0}'")]
    UnmappedEntity(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Query cancelled")]
    Cancelled,

    /// A returned document did not fit the requested type
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A terminal received an output shape it cannot use
    #[error("Unexpected result shape: {0}")]
    UnexpectedShape(String),
}

impl QueryError {
    pub fn remote(diagnostic: impl Into<String>) -> Self {
        Self::Remote {
            diagnostic: diagnostic.into(),
        }
    }

    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Translate(e) => e.code(),
            Self::Remote { .. } => "AERO_REMOTE_QUERY_FAILED",
            Self::UnmappedEntity(_) => "AERO_UNMAPPED_ENTITY",
            Self::Transport(e) => e.code(),
            Self::Cancelled => "AERO_QUERY_CANCELLED",
            Self::Decode(_) => "AERO_DECODE_FAILED",
            Self::UnexpectedShape(_) => "AERO_UNEXPECTED_SHAPE",
        }
    }

    /// True when the failure happened before any network call
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Translate(_) | Self::UnmappedEntity(_))
    }
}

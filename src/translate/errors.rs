//! Translator error types
//!
//! Error codes:
//! - AERO_QUERY_UNSUPPORTED (REJECT)
//! - AERO_QUERY_INVALID (REJECT)

use thiserror::Error;

/// Result type for translation
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Translation failures. Never retried: the query cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A chain node or predicate shape the target language cannot express
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A well-formed shape with an argument the caller got wrong
    #[error("Invalid query: {0}")]
    InvalidArgument(String),
}

impl TranslateError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported(reason.into())
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => "AERO_QUERY_UNSUPPORTED",
            Self::InvalidArgument(_) => "AERO_QUERY_INVALID",
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

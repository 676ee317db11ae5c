//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in query execution and change replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Query operations
    /// Query chain compiled into a request
    QueryTranslated,
    /// Query rejected before any network call
    QueryRejected,
    /// Query executed successfully
    QueryExecuted,
    /// Engine answered with an invalid response
    QueryRemoteFailed,

    // Change replay
    /// One pending change accepted by the engine
    ChangeApplied,
    /// One pending change answered with an invalid response
    ChangeRejected,
    /// Change batch finished
    ReplayComplete,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,
}

impl Event {
    /// Returns the event name as logged
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryTranslated => "QUERY_TRANSLATED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRemoteFailed => "QUERY_REMOTE_FAILED",
            Event::ChangeApplied => "CHANGE_APPLIED",
            Event::ChangeRejected => "CHANGE_REJECTED",
            Event::ReplayComplete => "REPLAY_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Default severity for this event
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryTranslated => Severity::Trace,
            Event::QueryRejected | Event::ChangeRejected => Severity::Warn,
            Event::QueryRemoteFailed => Severity::Error,
            Event::QueryExecuted
            | Event::ChangeApplied
            | Event::ReplayComplete
            | Event::ConfigLoaded => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

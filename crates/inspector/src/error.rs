//! Error types for the inspector agent's collaborators.

use thiserror::Error;

/// Errors raised by state storage, frontends, and trace parsing.
///
/// The agent itself never fails an enable, disable, or time stamp because of
/// these; it logs them and carries on.
#[derive(Debug, Error)]
pub enum InspectorError {
    /// Reading or writing persisted state failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or parse JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The frontend receiving metrics events has gone away
    #[error("Frontend is closed")]
    FrontendClosed,

    /// A trace line could not be parsed
    #[error("Invalid trace at line {line}: {message}")]
    InvalidTrace {
        /// 1-based line number
        line: usize,
        /// Parser message
        message: String,
    },
}

/// Result type for inspector operations.
pub type InspectorResult<T> = Result<T, InspectorError>;

//! Error types for the events module.

use thiserror::Error;

/// Errors that can occur while publishing or receiving events.
#[derive(Debug, Error)]
pub enum EventError {
    /// The fabric has not been started (or was stopped).
    #[error("event fabric not started")]
    NotStarted,

    /// The fabric or subscription was closed.
    #[error("event fabric closed")]
    Closed,

    /// Payload could not be encoded or decoded.
    #[error("payload encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A topic this participant does not understand.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, EventError>;

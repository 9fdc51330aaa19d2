//! Error types for questflow-session

use crate::SessionId;
use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading content or running sessions
#[derive(Debug, Error)]
pub enum Error {
    /// Error raised by the behavior runtime
    #[error("Runtime error: {0}")]
    Core(#[from] questflow_core::Error),

    /// IO error while reading content or configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed RON document
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Malformed JSON signal
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration values that cannot drive a session
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Game content that cannot be played
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// No session is registered under this id
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session exists but its driver has exited
    #[error("Session closed: {0}")]
    SessionClosed(SessionId),
}

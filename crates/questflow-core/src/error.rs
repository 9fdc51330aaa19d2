//! Error types for questflow-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Clock is already running")]
    ClockAlreadyRunning,

    #[error("Clock was stopped; reset it before starting again")]
    ClockStopped,

    #[error("Cancellation group is already cancelled")]
    GroupCancelled,

    #[error("Repeated behavior can complete without suspending: {0}")]
    RepeatWithoutSuspension(String),
}

impl Error {
    /// Build a type error from the expected type name and the offending value
    pub fn type_error(expected: impl Into<String>, got: &crate::Value) -> Self {
        Error::TypeError {
            expected: expected.into(),
            got: got.type_name().to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

//! Identity types for listener registrations and cancellers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle for one listener registered on an [`EventChannel`](crate::EventChannel)
///
/// Tokens are never reused by the channel that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerToken(pub u64);

impl ListenerToken {
    /// Create a new listener token
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw token value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener:{}", self.0)
    }
}

/// Identifier of a canceller stored in a [`CancelGroup`](crate::CancelGroup)
///
/// Unique within its group and never reused while the group is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CancelId(pub u64);

impl CancelId {
    /// Create a new canceller ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CancelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "canceller:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_token() {
        let token = ListenerToken::new(42);
        assert_eq!(token.raw(), 42);
        assert_eq!(format!("{}", token), "listener:42");
    }

    #[test]
    fn test_cancel_id() {
        let id = CancelId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{}", id), "canceller:7");
    }
}

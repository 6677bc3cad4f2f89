//! Chat request errors.

use thiserror::Error;

use crate::SereneError;

/// Why a chat request was abandoned.
///
/// None of these are fatal: the session keeps running and the client may
/// simply re-issue the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// No unclaimed user was available, or the connection holds none.
    #[error("no identity available")]
    NoIdentityAvailable,

    /// A directory or message store operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The client sent a malformed or unexpected event.
    #[error("invalid event: {0}")]
    Transport(String),
}

impl ChatError {
    /// Stable code sent to clients in `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::NoIdentityAvailable => "no_identity",
            ChatError::Storage(_) => "storage_error",
            ChatError::Transport(_) => "invalid_event",
        }
    }
}

impl From<SereneError> for ChatError {
    fn from(e: SereneError) -> Self {
        ChatError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ChatError::NoIdentityAvailable.code(), "no_identity");
        assert_eq!(ChatError::Storage("x".into()).code(), "storage_error");
        assert_eq!(ChatError::Transport("x".into()).code(), "invalid_event");
    }

    #[test]
    fn test_from_serene_error() {
        let err: ChatError = SereneError::Database("locked".to_string()).into();
        assert_eq!(err, ChatError::Storage("database error: locked".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ChatError::Transport("room name is empty".into()).to_string(),
            "invalid event: room name is empty"
        );
    }
}

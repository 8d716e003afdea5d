//! Error types for the conversation service.

use helpdesk_core::error::HelpdeskError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("please fill in all fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("server offline: {0}")]
    Offline(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<HelpdeskError> for ChatError {
    fn from(err: HelpdeskError) -> Self {
        match err {
            HelpdeskError::Offline(msg) | HelpdeskError::Unavailable(msg) => ChatError::Offline(msg),
            HelpdeskError::Validation(msg) => ChatError::Validation(msg),
            other => ChatError::StorageError(other.to_string()),
        }
    }
}

//! Error types for the conversational pipeline.

use jansathi_core::JanSathiError;
use jansathi_retrieval::RetrievalError;

/// Errors from the chat pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("model endpoint returned status {status}: {body}")]
    Model { status: u16, body: String },
    #[error("response parsing error: {0}")]
    ResponseParsing(String),
}

impl From<RetrievalError> for ChatError {
    fn from(err: RetrievalError) -> Self {
        ChatError::Stream(err.to_string())
    }
}

impl From<ChatError> for JanSathiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionUnavailable(msg) => JanSathiError::Session(msg),
            other => JanSathiError::Stream(other.to_string()),
        }
    }
}

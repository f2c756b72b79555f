//! Error types for the conversation layer.

use wikichat_core::error::WikiChatError;
use wikichat_wiki::ContentError;

/// Errors from the chat engine and session hosting.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("query exceeds maximum length of {0} characters")]
    QueryTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("content provider error: {0}")]
    Content(#[from] ContentError),
}

impl From<ChatError> for WikiChatError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::UnsupportedLanguage(lang) => WikiChatError::UnsupportedLanguage(lang),
            ChatError::Content(e) => e.into(),
            other => WikiChatError::Session(other.to_string()),
        }
    }
}

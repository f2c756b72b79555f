use thiserror::Error;

/// Top-level error type for the wikichat system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for WikiChatError` so that `?` works across crate
/// boundaries (the binary only ever sees this type).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WikiChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content error: {0}")]
    Content(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for WikiChatError {
    fn from(err: toml::de::Error) -> Self {
        WikiChatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for WikiChatError {
    fn from(err: toml::ser::Error) -> Self {
        WikiChatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for WikiChatError {
    fn from(err: serde_json::Error) -> Self {
        WikiChatError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for wikichat operations.
pub type Result<T> = std::result::Result<T, WikiChatError>;

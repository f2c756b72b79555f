use wikichat_core::error::WikiChatError;

/// Errors from narration synthesis.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("nothing to synthesize: text is empty")]
    EmptyText,
    #[error("TTS request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TTS endpoint returned HTTP {status} for chunk \"{chunk}\"")]
    Status { status: u16, chunk: String },
    #[error("TTS endpoint returned no audio")]
    EmptyAudio,
}

impl From<SpeechError> for WikiChatError {
    fn from(err: SpeechError) -> Self {
        WikiChatError::Speech(err.to_string())
    }
}

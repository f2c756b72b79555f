use async_trait::async_trait;
use wikichat_core::{Language, NarrationAudio};

use crate::error::SpeechError;

/// Text-to-speech source for turn narration.
#[async_trait]
pub trait NarrationProvider: Send + Sync {
    /// Synthesize `text` spoken in `language`.
    async fn synthesize(&self, text: &str, language: Language)
        -> Result<NarrationAudio, SpeechError>;
}

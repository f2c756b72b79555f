//! Google Translate text-to-speech client.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::debug;

use wikichat_core::config::SpeechConfig;
use wikichat_core::{Language, NarrationAudio};

use crate::chunk::split_for_synthesis;
use crate::error::SpeechError;
use crate::provider::NarrationProvider;

/// [`NarrationProvider`] backed by the `translate_tts` endpoint.
///
/// The endpoint only accepts short texts, so the narration is split into
/// chunks that are fetched concurrently and joined back in order. MP3 frames
/// concatenate into a playable stream.
#[derive(Clone)]
pub struct GoogleTtsClient {
    http: Client,
    config: SpeechConfig,
}

impl GoogleTtsClient {
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    async fn fetch_chunk(&self, chunk: &str, language: Language) -> Result<Bytes, SpeechError> {
        let speed = if self.config.slow { "0.3" } else { "1" };
        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language.code()),
                ("q", chunk),
                ("ttsspeed", speed),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Status {
                status: status.as_u16(),
                chunk: chunk.to_string(),
            });
        }
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl NarrationProvider for GoogleTtsClient {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<NarrationAudio, SpeechError> {
        let chunks = split_for_synthesis(text, self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let parts: Vec<Bytes> = stream::iter(0..chunks.len())
            .map(|i| self.fetch_chunk(&chunks[i], language))
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let mut audio = BytesMut::with_capacity(parts.iter().map(Bytes::len).sum());
        for part in &parts {
            audio.extend_from_slice(part);
        }
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        debug!(
            language = language.code(),
            chunks = chunks.len(),
            bytes = audio.len(),
            "Narration synthesized"
        );
        Ok(NarrationAudio::mp3(audio.freeze()))
    }
}

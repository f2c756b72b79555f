//! Wikichat speech crate - narration of article summaries.
//!
//! Provides the [`NarrationProvider`] trait and a client for the Google
//! Translate text-to-speech endpoint.

pub mod chunk;
pub mod client;
pub mod error;
pub mod provider;

pub use chunk::split_for_synthesis;
pub use client::GoogleTtsClient;
pub use error::SpeechError;
pub use provider::NarrationProvider;

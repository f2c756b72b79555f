use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WikiChatError;

/// Maximum number of images attached to a single turn.
pub const MAX_TURN_IMAGES: usize = 5;

/// MIME type of synthesized narration.
pub const MP3_MIME_TYPE: &str = "audio/mpeg";

// =============================================================================
// Language
// =============================================================================

/// A supported content/narration language.
///
/// Serialized as its provider code (`"en"`, `"kn"`, ...). The set is fixed;
/// English is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "kn")]
    Kannada,
    #[serde(rename = "ta")]
    Tamil,
    #[serde(rename = "te")]
    Telugu,
    #[serde(rename = "ur")]
    Urdu,
    #[serde(rename = "ml")]
    Malayalam,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "ja")]
    Japanese,
}

impl Language {
    /// Every supported language, in selector order.
    pub const ALL: [Language; 12] = [
        Language::English,
        Language::Kannada,
        Language::Tamil,
        Language::Telugu,
        Language::Urdu,
        Language::Malayalam,
        Language::Hindi,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Arabic,
        Language::Japanese,
    ];

    /// Provider language code (Wikipedia subdomain and TTS `tl`).
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Kannada => "kn",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Urdu => "ur",
            Language::Malayalam => "ml",
            Language::Hindi => "hi",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Arabic => "ar",
            Language::Japanese => "ja",
        }
    }

    /// Human-readable name shown in the language selector.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Kannada => "Kannada",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Urdu => "Urdu",
            Language::Malayalam => "Malayalam",
            Language::Hindi => "Hindi",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Arabic => "Arabic",
            Language::Japanese => "Japanese",
        }
    }

    /// Look up a language by its exact provider code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

impl FromStr for Language {
    type Err = WikiChatError;

    /// Accepts a code or a display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| {
                l.code().eq_ignore_ascii_case(needle)
                    || l.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| WikiChatError::UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// =============================================================================
// Narration audio
// =============================================================================

/// Synthesized narration for a turn.
///
/// The buffer is immutable and reference-counted: reading it for playback
/// never consumes it, so a turn can be rendered any number of times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrationAudio {
    data: Bytes,
    mime_type: &'static str,
}

impl NarrationAudio {
    /// Wrap an MP3 payload.
    pub fn mp3(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mime_type: MP3_MIME_TYPE,
        }
    }

    /// Cheap clone of the audio bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// =============================================================================
// Conversation turn
// =============================================================================

/// How a query resolution ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The page was found; the summary is the page synopsis.
    Answered,
    /// The title matched a disambiguation page.
    Ambiguous { candidates: Vec<String> },
    /// No page exists with that title.
    NotFound,
    /// Network, synthesis or any other unclassified failure.
    Failed { reason: String },
}

impl TurnOutcome {
    /// Short machine-readable label, used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            TurnOutcome::Answered => "answered",
            TurnOutcome::Ambiguous { .. } => "ambiguous",
            TurnOutcome::NotFound => "not_found",
            TurnOutcome::Failed { .. } => "failed",
        }
    }
}

/// The failure cases a recovered turn can report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecoveredOutcome {
    Ambiguous { candidates: Vec<String> },
    NotFound,
    Failed { reason: String },
}

impl From<RecoveredOutcome> for TurnOutcome {
    fn from(outcome: RecoveredOutcome) -> Self {
        match outcome {
            RecoveredOutcome::Ambiguous { candidates } => TurnOutcome::Ambiguous { candidates },
            RecoveredOutcome::NotFound => TurnOutcome::NotFound,
            RecoveredOutcome::Failed { reason } => TurnOutcome::Failed { reason },
        }
    }
}

/// One query/answer exchange in a session transcript.
///
/// Fields are private so the invariants hold for every value: at most
/// [`MAX_TURN_IMAGES`] images, and images/narration only on answered turns.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationTurn {
    id: Uuid,
    created_at: DateTime<Utc>,
    language: Language,
    query: String,
    summary_text: String,
    image_urls: Vec<String>,
    narration: Option<NarrationAudio>,
    outcome: TurnOutcome,
}

impl ConversationTurn {
    /// Build a turn from a successful resolution.
    ///
    /// `image_urls` beyond [`MAX_TURN_IMAGES`] are dropped.
    pub fn answered(
        query: impl Into<String>,
        language: Language,
        summary_text: impl Into<String>,
        mut image_urls: Vec<String>,
        narration: Option<NarrationAudio>,
    ) -> Self {
        image_urls.truncate(MAX_TURN_IMAGES);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            language,
            query: query.into(),
            summary_text: summary_text.into(),
            image_urls,
            narration,
            outcome: TurnOutcome::Answered,
        }
    }

    /// Build a turn whose bot message explains a failed resolution.
    ///
    /// Recovered turns never carry images or narration.
    pub fn recovered(
        query: impl Into<String>,
        language: Language,
        outcome: RecoveredOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            language,
            query: query.into(),
            summary_text: message.into(),
            image_urls: Vec::new(),
            narration: None,
            outcome: outcome.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The exact title the user selected.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn summary_text(&self) -> &str {
        &self.summary_text
    }

    pub fn image_urls(&self) -> &[String] {
        &self.image_urls
    }

    pub fn narration(&self) -> Option<&NarrationAudio> {
        self.narration.as_ref()
    }

    pub fn outcome(&self) -> &TurnOutcome {
        &self.outcome
    }

    pub fn is_answered(&self) -> bool {
        matches!(self.outcome, TurnOutcome::Answered)
    }
}

// =============================================================================
// Tests
// =============================================================================

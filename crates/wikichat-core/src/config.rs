use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WikiChatError};
use crate::types::Language;

/// Placeholder replaced by the language code in the content API URL.
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// Top-level configuration for wikichat.
///
/// Loaded from `~/.wikichat/config.toml` by default. Every section falls back
/// to its defaults when missing from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikiChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl WikiChatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WikiChatConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(WikiChatError::Config("server.port cannot be 0".into()));
        }
        if self.server.rate_limit_per_sec == 0 {
            return Err(WikiChatError::Config(
                "server.rate_limit_per_sec cannot be 0".into(),
            ));
        }
        if !self.content.api_url_template.contains(LANG_PLACEHOLDER) {
            return Err(WikiChatError::Config(format!(
                "content.api_url_template must contain {LANG_PLACEHOLDER}"
            )));
        }
        if !(1..=500).contains(&self.content.search_limit) {
            return Err(WikiChatError::Config(
                "content.search_limit must be between 1 and 500".into(),
            ));
        }
        if !(10..=200).contains(&self.speech.max_chunk_chars) {
            return Err(WikiChatError::Config(
                "speech.max_chunk_chars must be between 10 and 200".into(),
            ));
        }
        if self.speech.concurrency == 0 {
            return Err(WikiChatError::Config(
                "speech.concurrency must be at least 1".into(),
            ));
        }
        if self.session.max_sessions == 0 {
            return Err(WikiChatError::Config(
                "session.max_sessions must be at least 1".into(),
            ));
        }
        if self.session.max_query_length == 0 {
            return Err(WikiChatError::Config(
                "session.max_query_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Language selected for new sessions.
    pub default_language: Language,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_language: Language::English,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second accepted on session routes.
    pub rate_limit_per_sec: u64,
    /// Extra CORS origins; localhost on the server port is always allowed.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            rate_limit_per_sec: 50,
            allowed_origins: vec![],
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Encyclopedia content provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// MediaWiki Action API endpoint; `{lang}` is replaced by the language code.
    pub api_url_template: String,
    /// Maximum number of suggestions returned per search.
    pub search_limit: u32,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// User-Agent sent to the API (Wikimedia requires a descriptive one).
    pub user_agent: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_url_template: "https://{lang}.wikipedia.org/w/api.php".to_string(),
            search_limit: 10,
            timeout_secs: 15,
            user_agent: default_user_agent(),
        }
    }
}

impl ContentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API endpoint for a language.
    pub fn api_url(&self, language: Language) -> String {
        self.api_url_template
            .replace(LANG_PLACEHOLDER, language.code())
    }
}

/// Text-to-speech provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// When false, answered turns carry no narration.
    pub enabled: bool,
    pub endpoint: String,
    /// Characters per synthesis request.
    pub max_chunk_chars: usize,
    /// Chunk requests in flight at once.
    pub concurrency: usize,
    /// Slow speech rate.
    pub slow: bool,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://translate.google.com/translate_tts".to_string(),
            max_chunk_chars: 100,
            concurrency: 4,
            slow: false,
            timeout_secs: 30,
            user_agent: default_user_agent(),
        }
    }
}

impl SpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session hosting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions idle this long are discarded.
    pub idle_timeout_minutes: u64,
    /// Least recently used sessions are evicted beyond this count.
    pub max_sessions: usize,
    /// Seconds between expiry sweeps.
    pub purge_interval_secs: u64,
    /// Maximum query length in characters.
    pub max_query_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 60,
            max_sessions: 1000,
            purge_interval_secs: 60,
            max_query_length: 255,
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes.saturating_mul(60))
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }
}

fn default_user_agent() -> String {
    format!("wikichat/{} (encyclopedia chat bot)", env!("CARGO_PKG_VERSION"))
}

// =============================================================================
// Tests
// =============================================================================

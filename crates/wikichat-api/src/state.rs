//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use wikichat_chat::{ConversationEngine, SessionRegistry};
use wikichat_core::config::WikiChatConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Sessions
/// carry their own locks inside the registry.
#[derive(Clone)]
pub struct AppState {
    /// Read-only configuration.
    pub config: Arc<WikiChatConfig>,
    pub engine: Arc<ConversationEngine>,
    pub registry: Arc<SessionRegistry>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create the state with a registry sized from `config.session`.
    pub fn new(config: WikiChatConfig, engine: ConversationEngine) -> Self {
        let registry = SessionRegistry::from_config(&config.session);
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            registry: Arc::new(registry),
            start_time: Instant::now(),
        }
    }
}

pub mod config;
pub mod error;
pub mod types;

pub use config::WikiChatConfig;
pub use error::{Result, WikiChatError};
pub use types::*;

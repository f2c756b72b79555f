//! Conversational layer for wikichat.
//!
//! Resolves user queries into conversation turns, keeps per-user session
//! transcripts, and hosts live sessions between interactions.

pub mod engine;
pub mod error;
pub mod registry;
pub mod session;

pub use engine::{
    is_displayable_image, select_images, validate_query, ConversationEngine, EngineOptions,
    MAX_AMBIGUOUS_CANDIDATES,
};
pub use error::ChatError;
pub use registry::{SessionEntry, SessionHandle, SessionRegistry};
pub use session::{Session, SessionSnapshot};

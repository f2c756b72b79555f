//! Wikichat API crate - axum HTTP server and route handlers.
//!
//! Exposes the conversation over JSON: session lifecycle, suggestions,
//! turns, history, clearing and narration audio, plus the embedded chat
//! page.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod ui;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;

//! Wikichat content crate - encyclopedia search and page summaries.
//!
//! Defines the [`ContentProvider`] seam and its Wikipedia implementation
//! over the MediaWiki Action API.

pub mod client;
pub mod error;
pub mod provider;
mod markup;
mod response;

pub use client::WikipediaClient;
pub use error::ContentError;
pub use provider::{ContentProvider, FetchOptions, WikiPage};

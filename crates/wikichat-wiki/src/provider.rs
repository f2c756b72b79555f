//! The content provider seam used by the conversation engine.

use async_trait::async_trait;
use wikichat_core::Language;

use crate::error::ContentError;

/// How a page title is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Follow wiki redirects transparently.
    pub follow_redirects: bool,
    /// Replace the title by the best search hit before fetching.
    pub auto_suggest: bool,
}

impl FetchOptions {
    /// Exact title (or explicit redirect) only; no fuzzy matching.
    pub fn exact() -> Self {
        Self {
            follow_redirects: true,
            auto_suggest: false,
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::exact()
    }
}

/// A resolved encyclopedia article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPage {
    /// Canonical title after normalization and redirects.
    pub title: String,
    /// Plain-text introduction of the article.
    pub summary: String,
    /// Every image on the page, in provider order.
    pub image_urls: Vec<String>,
    pub url: Option<String>,
}

/// Source of article suggestions and summaries.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Candidate titles for a partial query, in provider order.
    async fn search(&self, text: &str, language: Language) -> Result<Vec<String>, ContentError>;

    /// Fetch an article by title.
    async fn fetch_page(
        &self,
        title: &str,
        language: Language,
        options: FetchOptions,
    ) -> Result<WikiPage, ContentError>;
}

//! Wikipedia content provider over the MediaWiki Action API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use wikichat_core::config::ContentConfig;
use wikichat_core::Language;

use crate::error::ContentError;
use crate::provider::{ContentProvider, FetchOptions, WikiPage};
use crate::response::{self, PageLookup};

/// Parameters shared by every request.
const BASE_PARAMS: [(&str, &str); 2] = [("format", "json"), ("formatversion", "2")];

/// [`ContentProvider`] backed by `{lang}.wikipedia.org`.
#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    config: ContentConfig,
}

impl WikipediaClient {
    pub fn new(config: ContentConfig) -> Result<Self, ContentError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Issue one API request for `action` and return the raw body.
    async fn call(
        &self,
        language: Language,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<String, ContentError> {
        let url = self.config.api_url(language);
        debug!(url = %url, action, ?params, "MediaWiki request");
        let body = self
            .http
            .get(&url)
            .query(&[("action", action)])
            .query(&BASE_PARAMS)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    async fn query(
        &self,
        language: Language,
        params: &[(&str, &str)],
    ) -> Result<String, ContentError> {
        self.call(language, "query", params).await
    }

    /// Candidates listed on a disambiguation page, in page order.
    async fn disambiguation_options(
        &self,
        title: &str,
        language: Language,
    ) -> Result<Vec<String>, ContentError> {
        let body = self
            .call(language, "parse", &[("page", title), ("prop", "text")])
            .await?;
        response::parse_disambiguation(&body)
    }

    async fn image_urls(&self, title: &str, language: Language) -> Result<Vec<String>, ContentError> {
        let body = self
            .query(
                language,
                &[
                    ("generator", "images"),
                    ("gimlimit", "max"),
                    ("prop", "imageinfo"),
                    ("iiprop", "url"),
                    ("titles", title),
                ],
            )
            .await?;
        response::parse_image_urls(&body)
    }
}

#[async_trait]
impl ContentProvider for WikipediaClient {
    async fn search(&self, text: &str, language: Language) -> Result<Vec<String>, ContentError> {
        let limit = self.config.search_limit.to_string();
        let body = self
            .query(
                language,
                &[
                    ("list", "search"),
                    ("srsearch", text),
                    ("srlimit", limit.as_str()),
                    ("srprop", ""),
                ],
            )
            .await?;
        let titles = response::parse_search(&body)?;
        debug!(query = text, language = language.code(), hits = titles.len(), "Search complete");
        Ok(titles)
    }

    async fn fetch_page(
        &self,
        title: &str,
        language: Language,
        options: FetchOptions,
    ) -> Result<WikiPage, ContentError> {
        let title = if options.auto_suggest {
            self.search(title, language)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ContentError::NotFound(title.to_string()))?
        } else {
            title.to_string()
        };

        let mut params = vec![
            ("prop", "info|pageprops|extracts"),
            ("ppprop", "disambiguation"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("inprop", "url"),
            ("titles", title.as_str()),
        ];
        if options.follow_redirects {
            params.push(("redirects", "1"));
        }
        let body = self.query(language, &params).await?;

        match response::parse_page(&body, &title, options.follow_redirects)? {
            PageLookup::Disambiguation { title } => {
                let options = self.disambiguation_options(&title, language).await?;
                debug!(title = %title, candidates = options.len(), "Disambiguation page");
                Err(ContentError::Ambiguous { title, options })
            }
            PageLookup::Article { title, summary, url } => {
                let image_urls = self.image_urls(&title, language).await?;
                debug!(title = %title, images = image_urls.len(), "Page fetched");
                Ok(WikiPage {
                    title,
                    summary,
                    image_urls,
                    url,
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! MediaWiki Action API response shapes (`formatversion=2`) and the pure
//! parsing that turns them into titles, pages and image URLs.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ContentError;
use crate::markup;

#[derive(Debug, Deserialize)]
struct Envelope<Q> {
    query: Option<Q>,
    error: Option<ApiErrorBody>,
}

/// Envelope of an `action=parse` reply.
#[derive(Debug, Deserialize)]
struct ParseEnvelope {
    parse: Option<ParsedPage>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<PageRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct PageRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    redirect: bool,
    #[serde(default)]
    pageprops: Option<PageProps>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct PageProps {
    #[serde(default)]
    disambiguation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    #[serde(default)]
    url: Option<String>,
}

/// What a title lookup resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageLookup {
    Article {
        title: String,
        summary: String,
        url: Option<String>,
    },
    Disambiguation {
        title: String,
    },
}

/// Decode an API body, surfacing the `error` object when present.
///
/// A missing `query` member is legal (e.g. a generator with no results) and
/// yields the query type's default.
fn decode<Q: DeserializeOwned + Default>(body: &str) -> Result<Q, ContentError> {
    let envelope: Envelope<Q> = serde_json::from_str(body)?;
    if let Some(err) = envelope.error {
        return Err(ContentError::Api {
            code: err.code,
            info: err.info,
        });
    }
    Ok(envelope.query.unwrap_or_default())
}

/// Titles from a `list=search` response, in rank order.
pub(crate) fn parse_search(body: &str) -> Result<Vec<String>, ContentError> {
    let query: SearchQuery = decode(body)?;
    Ok(query.search.into_iter().map(|hit| hit.title).collect())
}

/// Classify a `prop=info|pageprops|extracts` response for one title.
pub(crate) fn parse_page(
    body: &str,
    requested: &str,
    follow_redirects: bool,
) -> Result<PageLookup, ContentError> {
    let query: PagesQuery = decode(body)?;
    let page = query
        .pages
        .into_iter()
        .next()
        .ok_or_else(|| ContentError::InvalidResponse("no pages in response".to_string()))?;

    if page.missing || page.invalid {
        return Err(ContentError::NotFound(requested.to_string()));
    }
    if page.redirect && !follow_redirects {
        return Err(ContentError::Redirect { title: page.title });
    }
    let is_disambiguation = page
        .pageprops
        .as_ref()
        .is_some_and(|props| props.disambiguation.is_some());
    if is_disambiguation {
        return Ok(PageLookup::Disambiguation { title: page.title });
    }

    Ok(PageLookup::Article {
        title: page.title,
        summary: page.extract.unwrap_or_default().trim().to_string(),
        url: page.fullurl,
    })
}

/// Candidate titles of a disambiguation page from its `action=parse`
/// rendering, in page order.
pub(crate) fn parse_disambiguation(body: &str) -> Result<Vec<String>, ContentError> {
    let envelope: ParseEnvelope = serde_json::from_str(body)?;
    if let Some(err) = envelope.error {
        return Err(ContentError::Api {
            code: err.code,
            info: err.info,
        });
    }
    let page = envelope
        .parse
        .ok_or_else(|| ContentError::InvalidResponse("no parse output in response".to_string()))?;
    Ok(markup::list_item_links(&page.text))
}

/// File URLs from a `generator=images&prop=imageinfo` response.
pub(crate) fn parse_image_urls(body: &str) -> Result<Vec<String>, ContentError> {
    let query: PagesQuery = decode(body)?;
    Ok(query
        .pages
        .into_iter()
        .filter_map(|page| page.imageinfo.into_iter().next())
        .filter_map(|info| info.url)
        .collect())
}

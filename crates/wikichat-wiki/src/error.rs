//! Error types for the encyclopedia content provider.

use wikichat_core::error::WikiChatError;

/// Errors from a content provider lookup.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("\"{title}\" may refer to: {}", options.join(", "))]
    Ambiguous { title: String, options: Vec<String> },
    #[error("page \"{0}\" does not match any pages")]
    NotFound(String),
    #[error("\"{title}\" resulted in a redirect and redirects are disabled")]
    Redirect { title: String },
    #[error("MediaWiki API error {code}: {info}")]
    Api { code: String, info: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::InvalidResponse(err.to_string())
    }
}

impl From<ContentError> for WikiChatError {
    fn from(err: ContentError) -> Self {
        WikiChatError::Content(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_error_display() {
        let err = ContentError::Ambiguous {
            title: "Mercury".to_string(),
            options: vec!["Mercury (planet)".to_string(), "Mercury (element)".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "\"Mercury\" may refer to: Mercury (planet), Mercury (element)"
        );

        let err = ContentError::NotFound("Xyzzy".to_string());
        assert_eq!(err.to_string(), "page \"Xyzzy\" does not match any pages");

        let err = ContentError::Api {
            code: "badvalue".to_string(),
            info: "Unrecognized value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "MediaWiki API error badvalue: Unrecognized value"
        );

        let err = ContentError::InvalidResponse("missing query".to_string());
        assert_eq!(err.to_string(), "invalid API response: missing query");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: Result<serde_json::Value, _> = serde_json::from_str("<html>");
        let err: ContentError = err.unwrap_err().into();
        assert!(matches!(err, ContentError::InvalidResponse(_)));
    }

    #[test]
    fn test_into_wikichat_error() {
        let err: WikiChatError = ContentError::NotFound("Nowhere".to_string()).into();
        assert!(matches!(err, WikiChatError::Content(_)));
        assert!(err.to_string().contains("Nowhere"));
    }
}

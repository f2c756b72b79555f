//! The embedded single-page chat client.

/// Self-contained chat page served at `/` and `/ui`.
///
/// Talks to the JSON API only: chat and history tabs, language selector,
/// light/dark theme toggle and a clear-conversation button.
pub const CHAT_HTML: &str = include_str!("../assets/chat.html");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_uses_session_api() {
        assert!(CHAT_HTML.starts_with("<!DOCTYPE html>"));
        assert!(CHAT_HTML.contains("/sessions"));
        assert!(CHAT_HTML.contains("/languages"));
        assert!(CHAT_HTML.contains("/suggestions"));
        assert!(CHAT_HTML.contains("/clear"));
    }

    #[test]
    fn test_submit_resolves_top_suggestion_only() {
        assert!(CHAT_HTML.contains("pickTopSuggestion();"));
        assert!(!CHAT_HTML.contains(r#"ask($("query").value)"#));
    }
}

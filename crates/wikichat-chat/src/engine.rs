//! Conversation engine: turns a selected title into a conversation turn.
//!
//! `suggest` powers the type-ahead list, `resolve` performs one lookup and
//! always yields a turn (errors become explanatory bot messages), and
//! `respond` records the result in a session.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use wikichat_core::config::WikiChatConfig;
use wikichat_core::{ConversationTurn, Language, RecoveredOutcome, MAX_TURN_IMAGES};
use wikichat_speech::{NarrationProvider, SpeechError};
use wikichat_wiki::{ContentError, ContentProvider, FetchOptions};

use crate::error::ChatError;
use crate::session::Session;

/// Candidates listed in an ambiguity message.
pub const MAX_AMBIGUOUS_CANDIDATES: usize = 5;

/// Image extensions the chat page can display.
const DISPLAYABLE_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const NOT_FOUND_MESSAGE: &str = "Sorry, I couldn't find a page matching your query.";

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Synthesize narration for answered turns.
    pub narration_enabled: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            narration_enabled: true,
        }
    }
}

impl From<&WikiChatConfig> for EngineOptions {
    fn from(config: &WikiChatConfig) -> Self {
        Self {
            narration_enabled: config.speech.enabled,
        }
    }
}

/// Why a resolution did not produce an answer.
#[derive(Debug)]
enum ResolveFailure {
    Content(ContentError),
    Speech(SpeechError),
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveFailure::Content(e) => write!(f, "{e}"),
            ResolveFailure::Speech(e) => write!(f, "{e}"),
        }
    }
}

impl From<ContentError> for ResolveFailure {
    fn from(err: ContentError) -> Self {
        ResolveFailure::Content(err)
    }
}

impl From<SpeechError> for ResolveFailure {
    fn from(err: SpeechError) -> Self {
        ResolveFailure::Speech(err)
    }
}

impl ResolveFailure {
    /// Turn the failure into the bot message shown to the user.
    fn into_turn(self, query: &str, language: Language) -> ConversationTurn {
        match self {
            ResolveFailure::Content(ContentError::Ambiguous { options, .. }) => {
                let candidates: Vec<String> =
                    options.into_iter().take(MAX_AMBIGUOUS_CANDIDATES).collect();
                let message = format!(
                    "Your query is ambiguous. Did you mean: {}?",
                    candidates.join(", ")
                );
                ConversationTurn::recovered(
                    query,
                    language,
                    RecoveredOutcome::Ambiguous { candidates },
                    message,
                )
            }
            ResolveFailure::Content(ContentError::NotFound(_)) => {
                ConversationTurn::recovered(
                    query,
                    language,
                    RecoveredOutcome::NotFound,
                    NOT_FOUND_MESSAGE,
                )
            }
            other => {
                let reason = other.to_string();
                let message = format!("Oops, something went wrong. {reason}");
                ConversationTurn::recovered(
                    query,
                    language,
                    RecoveredOutcome::Failed { reason },
                    message,
                )
            }
        }
    }
}

/// Resolves queries against the content and narration providers.
pub struct ConversationEngine {
    content: Arc<dyn ContentProvider>,
    narration: Arc<dyn NarrationProvider>,
    options: EngineOptions,
}

impl ConversationEngine {
    pub fn new(
        content: Arc<dyn ContentProvider>,
        narration: Arc<dyn NarrationProvider>,
        options: EngineOptions,
    ) -> Self {
        Self {
            content,
            narration,
            options,
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Article titles matching a partial query, in provider order.
    ///
    /// The text is trimmed before searching. Whitespace-only input counts
    /// as empty, not just `""`, and returns an empty list without contacting
    /// the provider.
    pub async fn suggest(
        &self,
        raw_query: &str,
        language: Language,
    ) -> Result<Vec<String>, ContentError> {
        let text = raw_query.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let titles = self.content.search(text, language).await?;
        debug!(query = text, language = language.code(), count = titles.len(), "Suggestions");
        Ok(titles)
    }

    /// Look up `query` and build the resulting turn.
    ///
    /// Never fails: ambiguity, missing pages and provider errors are all
    /// reported as a turn whose summary explains what happened.
    pub async fn resolve(&self, query: &str, language: Language) -> ConversationTurn {
        let start = Instant::now();
        let turn = match self.try_resolve(query, language).await {
            Ok(turn) => turn,
            Err(failure) => {
                let expected = matches!(
                    failure,
                    ResolveFailure::Content(
                        ContentError::Ambiguous { .. } | ContentError::NotFound(_)
                    )
                );
                if expected {
                    debug!(query, error = %failure, "Query not answered");
                } else {
                    warn!(query, error = %failure, "Query resolution failed");
                }
                failure.into_turn(query, language)
            }
        };
        info!(
            query,
            language = language.code(),
            outcome = turn.outcome().label(),
            images = turn.image_urls().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query resolved"
        );
        turn
    }

    /// Resolve `query` and record the turn in `session`.
    pub async fn respond(&self, mut session: Session, query: &str, language: Language) -> Session {
        let turn = self.resolve(query, language).await;
        session.append_turn(turn, query);
        session
    }

    async fn try_resolve(
        &self,
        query: &str,
        language: Language,
    ) -> Result<ConversationTurn, ResolveFailure> {
        let options = FetchOptions {
            follow_redirects: true,
            auto_suggest: false,
        };
        let page = self.content.fetch_page(query, language, options).await?;
        let image_urls = select_images(&page.image_urls);

        let narration = if self.options.narration_enabled {
            Some(self.narration.synthesize(&page.summary, language).await?)
        } else {
            None
        };

        Ok(ConversationTurn::answered(
            query,
            language,
            page.summary,
            image_urls,
            narration,
        ))
    }
}

/// Check a submitted query before resolution.
pub fn validate_query(query: &str, max_chars: usize) -> Result<(), ChatError> {
    if query.trim().is_empty() {
        return Err(ChatError::EmptyQuery);
    }
    if query.chars().count() > max_chars {
        return Err(ChatError::QueryTooLong(max_chars));
    }
    Ok(())
}

/// Keep the first displayable images, in provider order.
pub fn select_images(urls: &[String]) -> Vec<String> {
    urls.iter()
        .filter(|url| is_displayable_image(url))
        .take(MAX_TURN_IMAGES)
        .cloned()
        .collect()
}

/// Whether the URL path ends in a jpg/jpeg/png file name.
pub fn is_displayable_image(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| {
            DISPLAYABLE_IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use wikichat_core::{NarrationAudio, TurnOutcome};
    use wikichat_wiki::WikiPage;

    use super::*;

    enum Scripted {
        Page(WikiPage),
        Ambiguous(Vec<String>),
        NotFound,
        Broken(String),
    }

    #[derive(Default)]
    struct MockContent {
        pages: HashMap<String, Scripted>,
        suggestions: Vec<String>,
        search_calls: AtomicUsize,
        fetches: Mutex<Vec<(String, Language, FetchOptions)>>,
    }

    impl MockContent {
        fn with(mut self, title: &str, scripted: Scripted) -> Self {
            self.pages.insert(title.to_string(), scripted);
            self
        }
    }

    #[async_trait]
    impl ContentProvider for MockContent {
        async fn search(
            &self,
            _text: &str,
            _language: Language,
        ) -> Result<Vec<String>, ContentError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.suggestions.clone())
        }

        async fn fetch_page(
            &self,
            title: &str,
            language: Language,
            options: FetchOptions,
        ) -> Result<WikiPage, ContentError> {
            self.fetches
                .lock()
                .unwrap()
                .push((title.to_string(), language, options));
            match self.pages.get(title) {
                Some(Scripted::Page(page)) => Ok(page.clone()),
                Some(Scripted::Ambiguous(options)) => Err(ContentError::Ambiguous {
                    title: title.to_string(),
                    options: options.clone(),
                }),
                Some(Scripted::Broken(msg)) => Err(ContentError::InvalidResponse(msg.clone())),
                Some(Scripted::NotFound) | None => Err(ContentError::NotFound(title.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct MockNarration {
        fail: bool,
        calls: Mutex<Vec<(String, Language)>>,
    }

    #[async_trait]
    impl NarrationProvider for MockNarration {
        async fn synthesize(
            &self,
            text: &str,
            language: Language,
        ) -> Result<NarrationAudio, SpeechError> {
            self.calls.lock().unwrap().push((text.to_string(), language));
            if self.fail {
                return Err(SpeechError::Status {
                    status: 503,
                    chunk: text.to_string(),
                });
            }
            Ok(NarrationAudio::mp3(Bytes::from_static(b"ID3-mock")))
        }
    }

    fn page(title: &str, summary: &str, images: &[&str]) -> WikiPage {
        WikiPage {
            title: title.to_string(),
            summary: summary.to_string(),
            image_urls: images.iter().map(|s| s.to_string()).collect(),
            url: None,
        }
    }

    fn engine(
        content: MockContent,
        narration: MockNarration,
    ) -> (ConversationEngine, Arc<MockContent>, Arc<MockNarration>) {
        let content = Arc::new(content);
        let narration = Arc::new(narration);
        let engine = ConversationEngine::new(
            content.clone(),
            narration.clone(),
            EngineOptions::default(),
        );
        (engine, content, narration)
    }

    #[tokio::test]
    async fn test_suggest_empty_query_skips_provider() {
        let content = MockContent {
            suggestions: vec!["Anything".to_string()],
            ..MockContent::default()
        };
        let (engine, content, _) = engine(content, MockNarration::default());

        assert!(engine.suggest("", Language::English).await.unwrap().is_empty());
        assert!(engine.suggest("   ", Language::Hindi).await.unwrap().is_empty());
        assert_eq!(content.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_suggest_returns_provider_order() {
        let content = MockContent {
            suggestions: vec!["Albert Einstein".to_string(), "Einstein family".to_string()],
            ..MockContent::default()
        };
        let (engine, content, _) = engine(content, MockNarration::default());

        let titles = engine.suggest("einst", Language::English).await.unwrap();
        assert_eq!(titles, vec!["Albert Einstein", "Einstein family"]);
        assert_eq!(content.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_answered_filters_images() {
        let content = MockContent::default().with(
            "Albert Einstein",
            Scripted::Page(page(
                "Albert Einstein",
                "Albert Einstein was a physicist.",
                &["a.jpg", "b.gif", "c.png"],
            )),
        );
        let (engine, content, narration) = engine(content, MockNarration::default());

        let turn = engine.resolve("Albert Einstein", Language::English).await;
        assert!(turn.is_answered());
        assert_eq!(turn.summary_text(), "Albert Einstein was a physicist.");
        assert_eq!(turn.image_urls(), ["a.jpg".to_string(), "c.png".to_string()]);
        assert_eq!(
            turn.narration().map(|a| a.as_slice()),
            Some(&b"ID3-mock"[..])
        );

        let fetches = content.fetches.lock().unwrap();
        assert_eq!(fetches[0].2, FetchOptions { follow_redirects: true, auto_suggest: false });
        let calls = narration.calls.lock().unwrap();
        assert_eq!(calls[0], ("Albert Einstein was a physicist.".to_string(), Language::English));
    }

    #[tokio::test]
    async fn test_resolve_caps_images_at_five() {
        let images = [
            "1.jpg", "2.svg", "3.JPEG", "4.png", "5.PNG", "6.jpg", "7.jpg", "8.jpg",
        ];
        let content = MockContent::default()
            .with("Tokyo", Scripted::Page(page("Tokyo", "Tokyo is big.", &images)));
        let (engine, _, _) = engine(content, MockNarration::default());

        let turn = engine.resolve("Tokyo", Language::Japanese).await;
        assert_eq!(
            turn.image_urls(),
            ["1.jpg", "3.JPEG", "4.png", "5.PNG", "6.jpg"].map(String::from)
        );
        assert!(turn
            .image_urls()
            .iter()
            .all(|u| is_displayable_image(u)));
    }

    #[tokio::test]
    async fn test_resolve_ambiguous() {
        let content = MockContent::default().with(
            "Mercury",
            Scripted::Ambiguous(vec![
                "Mercury (planet)".to_string(),
                "Mercury (element)".to_string(),
            ]),
        );
        let (engine, _, narration) = engine(content, MockNarration::default());

        let turn = engine.resolve("Mercury", Language::English).await;
        assert_eq!(
            turn.summary_text(),
            "Your query is ambiguous. Did you mean: Mercury (planet), Mercury (element)?"
        );
        assert!(turn.image_urls().is_empty());
        assert!(turn.narration().is_none());
        assert!(matches!(turn.outcome(), TurnOutcome::Ambiguous { candidates } if candidates.len() == 2));
        assert!(narration.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_ambiguous_lists_first_five() {
        let options: Vec<String> = (1..=8).map(|i| format!("Option {i}")).collect();
        let content = MockContent::default().with("Java", Scripted::Ambiguous(options));
        let (engine, _, _) = engine(content, MockNarration::default());

        let turn = engine.resolve("Java", Language::English).await;
        assert_eq!(
            turn.summary_text(),
            "Your query is ambiguous. Did you mean: Option 1, Option 2, Option 3, Option 4, Option 5?"
        );
        match turn.outcome() {
            TurnOutcome::Ambiguous { candidates } => assert_eq!(candidates.len(), 5),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let (engine, _, _) = engine(MockContent::default(), MockNarration::default());
        let turn = engine.resolve("Xyzzy qwerty", Language::English).await;
        assert_eq!(
            turn.summary_text(),
            "Sorry, I couldn't find a page matching your query."
        );
        assert_eq!(turn.outcome(), &TurnOutcome::NotFound);
        assert!(turn.image_urls().is_empty());
        assert!(turn.narration().is_none());
    }

    #[tokio::test]
    async fn test_resolve_other_failure() {
        let content = MockContent::default()
            .with("Paris", Scripted::Broken("connection reset".to_string()));
        let (engine, _, _) = engine(content, MockNarration::default());

        let turn = engine.resolve("Paris", Language::French).await;
        assert_eq!(
            turn.summary_text(),
            "Oops, something went wrong. invalid API response: connection reset"
        );
        assert!(matches!(turn.outcome(), TurnOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_synthesis_failure_fails_whole_turn() {
        let content = MockContent::default().with(
            "Paris",
            Scripted::Page(page("Paris", "Paris is the capital.", &["p.jpg"])),
        );
        let narration = MockNarration {
            fail: true,
            ..MockNarration::default()
        };
        let (engine, _, _) = engine(content, narration);

        let turn = engine.resolve("Paris", Language::French).await;
        assert!(turn.summary_text().starts_with("Oops, something went wrong."));
        assert!(turn.image_urls().is_empty());
        assert!(turn.narration().is_none());
        assert!(matches!(turn.outcome(), TurnOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_narration_disabled() {
        let content = MockContent::default().with(
            "Paris",
            Scripted::Page(page("Paris", "Paris is the capital.", &["p.jpg"])),
        );
        let narration = Arc::new(MockNarration {
            fail: true,
            ..MockNarration::default()
        });
        let engine = ConversationEngine::new(
            Arc::new(content),
            narration.clone(),
            EngineOptions {
                narration_enabled: false,
            },
        );

        let turn = engine.resolve("Paris", Language::French).await;
        assert!(turn.is_answered());
        assert!(turn.narration().is_none());
        assert_eq!(turn.image_urls(), ["p.jpg".to_string()]);
        assert!(narration.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_uses_given_language() {
        let content = MockContent::default().with(
            "Berlin",
            Scripted::Page(page("Berlin", "Berlin ist die Hauptstadt.", &[])),
        );
        let (engine, content, narration) = engine(content, MockNarration::default());

        let turn = engine.resolve("Berlin", Language::German).await;
        assert_eq!(turn.language(), Language::German);
        assert_eq!(content.fetches.lock().unwrap()[0].1, Language::German);
        assert_eq!(narration.calls.lock().unwrap()[0].1, Language::German);
    }

    #[tokio::test]
    async fn test_respond_appends_turn_and_query() {
        let content = MockContent::default()
            .with("Paris", Scripted::Page(page("Paris", "Paris.", &[])));
        let (engine, _, _) = engine(content, MockNarration::default());

        let session = engine.respond(Session::new(), "Paris", Language::English).await;
        let session = engine.respond(session, "Nowhere", Language::English).await;

        let snap = session.snapshot();
        assert_eq!(snap.turns.len(), 2);
        assert_eq!(snap.query_history, ["Paris".to_string(), "Nowhere".to_string()]);
        assert!(snap.turns[0].is_answered());
        assert_eq!(snap.turns[1].outcome(), &TurnOutcome::NotFound);
    }

    #[test]
    fn test_is_displayable_image() {
        assert!(is_displayable_image("https://upload.example/a/ab/Einstein.jpg"));
        assert!(is_displayable_image("https://upload.example/x/Photo.JPEG"));
        assert!(is_displayable_image("https://upload.example/x/map.Png?width=300"));
        assert!(is_displayable_image("https://upload.example/x/map.png#frag"));
        assert!(!is_displayable_image("https://upload.example/x/Flag.svg"));
        assert!(!is_displayable_image("https://upload.example/x/anim.gif"));
        assert!(!is_displayable_image("https://upload.example/x.jpg/file"));
        assert!(!is_displayable_image("https://upload.example/x/jpg"));
        assert!(!is_displayable_image(""));
    }

    #[test]
    fn test_select_images_preserves_order() {
        let urls: Vec<String> = ["b.png", "a.gif", "a.jpg"].iter().map(|s| s.to_string()).collect();
        assert_eq!(select_images(&urls), vec!["b.png", "a.jpg"]);
    }

    #[test]
    fn test_validate_query() {
        assert!(validate_query("Paris", 255).is_ok());
        assert!(matches!(validate_query("", 255), Err(ChatError::EmptyQuery)));
        assert!(matches!(validate_query("  \t", 255), Err(ChatError::EmptyQuery)));
        let long = "x".repeat(256);
        assert!(matches!(validate_query(&long, 255), Err(ChatError::QueryTooLong(255))));
        // Counted in characters, not bytes.
        assert!(validate_query(&"é".repeat(255), 255).is_ok());
    }

    #[test]
    fn test_engine_options_from_config() {
        let mut config = WikiChatConfig::default();
        assert!(EngineOptions::from(&config).narration_enabled);
        config.speech.enabled = false;
        assert!(!EngineOptions::from(&config).narration_enabled);
    }
}

//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/query/body parameters, works on the session
//! registry and conversation engine in `AppState`, and returns JSON.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use wikichat_chat::{validate_query, ChatError, SessionHandle};
use wikichat_core::{ConversationTurn, Language, TurnOutcome};

use crate::error::ApiError;
use crate::state::AppState;
use crate::ui::CHAT_HTML;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    /// Resume this session if it is still live.
    pub session_id: Option<Uuid>,
    /// Code or display name; defaults to the configured language.
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetLanguageRequest {
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    pub q: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTurnRequest {
    pub query: String,
    /// Override the session language for this turn only.
    pub language: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub code: Language,
    pub default: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageInfo>,
    pub default: Language,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub language: Language,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub id: Uuid,
    pub query: String,
    pub summary_text: String,
    pub image_urls: Vec<String>,
    pub outcome: TurnOutcome,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    /// Present only when the turn has narration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl TurnResponse {
    fn from_turn(session_id: Uuid, turn: &ConversationTurn) -> Self {
        Self {
            id: turn.id(),
            query: turn.query().to_string(),
            summary_text: turn.summary_text().to_string(),
            image_urls: turn.image_urls().to_vec(),
            outcome: turn.outcome().clone(),
            language: turn.language(),
            created_at: turn.created_at(),
            audio_url: turn
                .narration()
                .map(|_| format!("/sessions/{session_id}/turns/{}/audio", turn.id())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub language: Language,
    pub turns: Vec<TurnResponse>,
    pub query_history: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub query: String,
    pub language: Language,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 1 is the most recent query.
    pub position: usize,
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub session_id: Uuid,
    pub turns: usize,
    pub query_history: usize,
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_language(raw: &str) -> Result<Language, ApiError> {
    raw.parse::<Language>()
        .map_err(|_| ChatError::UnsupportedLanguage(raw.to_string()).into())
}

fn session(state: &AppState, id: Uuid) -> Result<SessionHandle, ApiError> {
    Ok(state.registry.get(id)?)
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.registry.len(),
    })
}

/// GET / and GET /ui - the embedded chat page.
pub async fn ui() -> impl IntoResponse {
    Html(CHAT_HTML)
}

/// GET /languages
pub async fn languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    let default = state.config.general.default_language;
    let languages = Language::ALL
        .into_iter()
        .map(|language| LanguageInfo {
            name: language.display_name().to_string(),
            code: language,
            default: language == default,
        })
        .collect();
    Json(LanguagesResponse { languages, default })
}

/// POST /sessions - open a new session or resume a live one.
///
/// The JSON body is optional.
pub async fn open_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionInfo>), ApiError> {
    let request: OpenSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        OpenSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?
    };

    let language = match request.language.as_deref() {
        Some(raw) => parse_language(raw)?,
        None => state.config.general.default_language,
    };

    let (session_id, language) = state.registry.open(request.session_id, language);
    Ok((
        StatusCode::CREATED,
        Json(SessionInfo {
            session_id,
            language,
        }),
    ))
}

/// GET /sessions/{id} - full transcript snapshot.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let language = state.registry.language(id)?;
    let handle = session(&state, id)?;
    let entry = handle.lock().await;
    let snapshot = entry.session.snapshot();
    Ok(Json(SessionResponse {
        session_id: id,
        language,
        turns: snapshot
            .turns
            .iter()
            .map(|turn| TurnResponse::from_turn(id, turn))
            .collect(),
        query_history: snapshot.query_history.to_vec(),
    }))
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.registry.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /sessions/{id}/language - affects later turns only.
pub async fn set_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetLanguageRequest>,
) -> Result<Json<SessionInfo>, ApiError> {
    let language = parse_language(&request.language)?;
    state.registry.set_language(id, language)?;
    info!(session_id = %id, language = language.code(), "Session language changed");
    Ok(Json(SessionInfo {
        session_id: id,
        language,
    }))
}

/// GET /sessions/{id}/suggestions?q=&language=
pub async fn suggestions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    // Read from the registry, not the session lock, so type-ahead keeps
    // answering while a turn is being resolved.
    let session_language = state.registry.language(id)?;
    let language = match params.language.as_deref() {
        Some(raw) => parse_language(raw)?,
        None => session_language,
    };
    let query = params.q.unwrap_or_default();
    let suggestions = state
        .engine
        .suggest(&query, language)
        .await
        .map_err(ChatError::from)?;
    Ok(Json(SuggestionsResponse {
        query,
        language,
        suggestions,
    }))
}

/// POST /sessions/{id}/turns - resolve a query and record the turn.
pub async fn create_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateTurnRequest>,
) -> Result<(StatusCode, Json<TurnResponse>), ApiError> {
    validate_query(&request.query, state.config.session.max_query_length)?;
    let override_language = request.language.as_deref().map(parse_language).transpose()?;

    let language = match override_language {
        Some(language) => language,
        None => state.registry.language(id)?,
    };
    let handle = session(&state, id)?;
    let mut entry = handle.lock().await;

    // The stored session is replaced only once the interaction completes.
    let current = entry.session.clone();
    entry.session = state.engine.respond(current, &request.query, language).await;

    let turn = entry
        .session
        .snapshot()
        .turns
        .last()
        .map(|turn| TurnResponse::from_turn(id, turn))
        .ok_or_else(|| ApiError::Internal("turn was not recorded".to_string()))?;
    Ok((StatusCode::CREATED, Json(turn)))
}

/// GET /sessions/{id}/history - newest first.
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let handle = session(&state, id)?;
    let entry = handle.lock().await;
    let entries = entry
        .session
        .history_newest_first()
        .into_iter()
        .enumerate()
        .map(|(i, query)| HistoryEntry {
            position: i + 1,
            query: query.to_string(),
        })
        .collect();
    Ok(Json(HistoryResponse {
        session_id: id,
        entries,
    }))
}

/// POST /sessions/{id}/clear
pub async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearResponse>, ApiError> {
    let handle = session(&state, id)?;
    let mut entry = handle.lock().await;
    entry.session.clear();
    info!(session_id = %id, "Session cleared");
    let snapshot = entry.session.snapshot();
    Ok(Json(ClearResponse {
        session_id: id,
        turns: snapshot.turns.len(),
        query_history: snapshot.query_history.len(),
    }))
}

/// GET /sessions/{id}/turns/{turn_id}/audio - narration MP3.
pub async fn turn_audio(
    State(state): State<AppState>,
    Path((id, turn_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let handle = session(&state, id)?;
    let entry = handle.lock().await;
    let turn = entry
        .session
        .turn(turn_id)
        .ok_or_else(|| ApiError::NotFound(format!("turn not found: {turn_id}")))?;
    let audio = turn
        .narration()
        .ok_or_else(|| ApiError::NotFound(format!("turn has no narration: {turn_id}")))?;
    Ok(([(header::CONTENT_TYPE, audio.mime_type())], audio.bytes()).into_response())
}

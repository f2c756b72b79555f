//! API error types and JSON error response formatting.
//!
//! Every failure leaves the server as `{"error": <code>, "message": <text>}`
//! with a matching HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use wikichat_chat::ChatError;
use wikichat_core::error::WikiChatError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. "bad_request", "not_found").
    pub error: String,
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - invalid query, language or body.
    BadRequest(String),
    /// 404 - unknown session, turn or audio.
    NotFound(String),
    /// 429 - rate limit exceeded.
    TooManyRequests(String),
    /// 502 - the content provider failed.
    BadGateway(String),
    /// 500 - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "too_many_requests", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match &err {
            ChatError::EmptyQuery
            | ChatError::QueryTooLong(_)
            | ChatError::UnsupportedLanguage(_) => ApiError::BadRequest(err.to_string()),
            ChatError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            ChatError::Content(_) => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl From<WikiChatError> for ApiError {
    fn from(err: WikiChatError) -> Self {
        match &err {
            WikiChatError::UnsupportedLanguage(_) | WikiChatError::Config(_) => {
                ApiError::BadRequest(err.to_string())
            }
            WikiChatError::Content(_) => ApiError::BadGateway(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

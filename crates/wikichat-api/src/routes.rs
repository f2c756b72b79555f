//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use wikichat_core::config::ServerConfig;
use wikichat_core::error::WikiChatError;

use crate::handlers;
use crate::rate_limit::{rate_limit, RateLimiter};
use crate::state::AppState;

/// Request bodies above this size are rejected.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Localhost on the server port plus any configured origins.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let defaults = [
        format!("http://127.0.0.1:{}", server.port),
        format!("http://localhost:{}", server.port),
    ];
    let origins: Vec<HeaderValue> = defaults
        .iter()
        .chain(server.allowed_origins.iter())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let limiter = RateLimiter::new(state.config.server.rate_limit_per_sec);

    let session_routes = Router::new()
        .route("/sessions", post(handlers::open_session))
        .route(
            "/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/{id}/language", put(handlers::set_language))
        .route("/sessions/{id}/suggestions", get(handlers::suggestions))
        .route("/sessions/{id}/turns", post(handlers::create_turn))
        .route(
            "/sessions/{id}/turns/{turn_id}/audio",
            get(handlers::turn_audio),
        )
        .route("/sessions/{id}/history", get(handlers::history))
        .route("/sessions/{id}/clear", post(handlers::clear_session))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit));

    let public_routes = Router::new()
        .route("/", get(handlers::ui))
        .route("/ui", get(handlers::ui))
        .route("/health", get(handlers::health))
        .route("/languages", get(handlers::languages));

    let cors = cors_layer(&state.config.server);

    public_routes
        .merge(session_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(server: &ServerConfig, state: AppState) -> Result<(), WikiChatError> {
    let addr = server.bind_address();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WikiChatError::Api(format!("Failed to bind {addr}: {e}")))?;

    info!(addr = %addr, "API server listening");
    info!("Chat page at http://{}/", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| WikiChatError::Api(format!("Server error: {e}")))?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

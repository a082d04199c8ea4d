//! Axum router assembly.

use axum::routing::{get, post};
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use super::chat::{health, post_chat, post_reset, ChatAppState};

/// Creates routes for chat endpoints.
///
/// REST Endpoints:
/// - POST /api/chat - Run one conversational turn
/// - POST /api/reset - Discard a conversation session
/// - GET /health - Liveness probe
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", post(post_chat))
        .route("/reset", post(post_reset))
}

/// Combined router with API routes, health, CORS, and request tracing.
pub fn app_router(server: &ServerConfig, state: ChatAppState) -> Router {
    Router::new()
        .nest("/api", chat_routes())
        .route("/health", get(health))
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = server.cors_origins_list();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

//! HTTP handlers for the chat endpoint.
//!
//! These handlers connect Axum routes to the application layer.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::application::{ChatError, ChatService, TurnReply};

/// Shared application state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub chat: Arc<ChatService>,
}

impl ChatAppState {
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self { chat }
    }
}

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Existing session to continue; omit to start a new one.
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// POST /api/chat - Run one conversational turn.
///
/// # Errors
/// - 400 Bad Request: empty message
/// - 500 Internal Server Error: session store failure
pub async fn post_chat(
    State(state): State<ChatAppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnReply>, ChatApiError> {
    if request.message.trim().is_empty() {
        return Err(ChatApiError::BadRequest("message must not be empty".to_string()));
    }

    let reply = state
        .chat
        .handle_turn(request.session_id, &request.message)
        .await?;
    Ok(Json(reply))
}

/// Request body for POST /api/reset.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
}

/// POST /api/reset - Discard a conversation session.
pub async fn post_reset(
    State(state): State<ChatAppState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, ChatApiError> {
    state.chat.reset(&request.session_id).await?;
    Ok(Json(ResetResponse { success: true }))
}

/// GET /health - Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// API-level error for chat endpoints.
#[derive(Debug)]
pub enum ChatApiError {
    BadRequest(String),
    Internal(String),
}

impl From<ChatError> for ChatApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Store(e) => ChatApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ChatApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ChatApiError::Internal(msg) => {
                error!(error = %msg, "chat request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

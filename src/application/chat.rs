//! Chat turn service.
//!
//! Owns the load/generate/persist cycle around the conversation engine.
//! The engine itself is stateless; everything durable about a conversation
//! lives in the session store, and a failed model call must leave the
//! stored session exactly as it was before the turn.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Map;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::booking::{estimate_trip_cost, CostBreakdown};
use crate::domain::conversation::{
    ChatMessage, ConversationEngine, ConversationSession, ConversationStep,
};
use crate::ports::{SessionStore, SessionStoreError};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

/// What a caller gets back from one turn.
///
/// Model failures do not surface here as errors; they come back as a
/// reply carrying the user-facing fallback text, so transports never have
/// to translate provider failures themselves.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub session_id: String,
    pub message: String,
    pub question: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tool_call: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_parameters: Vec<serde_json::Value>,
    pub collected_data: Map<String, serde_json::Value>,
    pub next_step: ConversationStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_breakdown: Option<CostBreakdown>,
}

pub struct ChatService {
    engine: ConversationEngine,
    store: Arc<dyn SessionStore>,
}

impl ChatService {
    pub fn new(engine: ConversationEngine, store: Arc<dyn SessionStore>) -> Self {
        Self { engine, store }
    }

    /// Runs one conversational turn.
    ///
    /// A missing or unknown `session_id` starts a fresh session under a new
    /// id. On model failure the session is not written back, so a retry of
    /// the same turn sees the same prior state.
    pub async fn handle_turn(
        &self,
        session_id: Option<String>,
        user_message: &str,
    ) -> Result<TurnReply, ChatError> {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut session = match self.store.load(&session_id).await? {
            Some(session) => session,
            None => {
                debug!(%session_id, "starting new conversation session");
                ConversationSession::new(&session_id)
            }
        };

        let outcome = match self.engine.generate_response(&session, user_message).await {
            Ok(outcome) => outcome,
            Err(err) => {
                info!(%session_id, error = %err, "model call failed, returning fallback reply");
                return Ok(TurnReply {
                    session_id,
                    message: err.user_message().to_string(),
                    question: String::new(),
                    tool_call: String::new(),
                    tool_parameters: Vec::new(),
                    collected_data: session.collected_data.as_map().clone(),
                    next_step: session.current_step.unwrap_or_else(ConversationStep::first),
                    cost_breakdown: None,
                });
            }
        };

        session.history.push(ChatMessage::user(user_message));
        session
            .history
            .push(ChatMessage::assistant(stored_assistant_content(&outcome.response)));
        session.current_step = Some(outcome.next_step);
        session.collected_data = outcome.collected_data;

        let cost_breakdown = if outcome.next_step == ConversationStep::EmailCollection {
            estimate_trip_cost(&session.collected_data)
        } else {
            None
        };

        self.store.save(&session).await?;
        debug!(
            %session_id,
            next_step = %outcome.next_step,
            history_len = session.history.len(),
            "turn persisted"
        );

        Ok(TurnReply {
            session_id,
            message: outcome.response.message,
            question: outcome.response.question,
            tool_call: outcome.response.tool_call,
            tool_parameters: outcome.response.tool_parameters,
            collected_data: session.collected_data.as_map().clone(),
            next_step: outcome.next_step,
            cost_breakdown,
        })
    }

    /// Discards a session. Unknown ids are a no-op.
    pub async fn reset(&self, session_id: &str) -> Result<(), ChatError> {
        self.store.delete(session_id).await?;
        info!(%session_id, "session reset");
        Ok(())
    }
}

/// Assistant turns are stored as the full normalized JSON so later prompt
/// assembly can recover the question/message split.
fn stored_assistant_content(response: &crate::domain::conversation::NormalizedResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|_| response.display_text().to_string())
}

//! Port for conversation session persistence.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::session::ConversationSession;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session storage error: {0}")]
    Storage(String),
}

/// Keyed storage for conversation sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session by id, `None` when no such session exists.
    async fn load(&self, session_id: &str)
        -> Result<Option<ConversationSession>, SessionStoreError>;

    /// Saves a session, replacing any previous version.
    async fn save(&self, session: &ConversationSession) -> Result<(), SessionStoreError>;

    /// Deletes a session; deleting a missing session is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), SessionStoreError>;
}

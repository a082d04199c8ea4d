//! In-memory session store.
//!
//! Keeps sessions in a process-local map. Suitable for development and
//! tests; a deployment wanting durability swaps in another `SessionStore`
//! implementation behind the same port.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::conversation::session::ConversationSession;
use crate::ports::session_store::{SessionStore, SessionStoreError};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationSession>, SessionStoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session: &ConversationSession) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::session::ChatMessage;

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let store = InMemorySessionStore::new();
        let mut session = ConversationSession::new("abc");
        session.history.push(ChatMessage::user("hi"));

        store.save(&session).await.unwrap();
        let loaded = store.load("abc").await.unwrap().unwrap();
        assert_eq!(loaded.history.len(), 1);
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let store = InMemorySessionStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_version() {
        let store = InMemorySessionStore::new();
        let session = ConversationSession::new("abc");
        store.save(&session).await.unwrap();

        let mut updated = session;
        updated.history.push(ChatMessage::user("again"));
        store.save(&updated).await.unwrap();

        let loaded = store.load("abc").await.unwrap().unwrap();
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemorySessionStore::new();
        store.save(&ConversationSession::new("abc")).await.unwrap();
        store.delete("abc").await.unwrap();
        store.delete("abc").await.unwrap();
        assert!(store.is_empty().await);
    }
}

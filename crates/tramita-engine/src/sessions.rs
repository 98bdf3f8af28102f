//! Session lifecycle management.
//!
//! Thin coordination over the session-store contract; the query engine and
//! the HTTP layer both go through here rather than touching the store
//! directly.

use std::sync::Arc;

use tracing::info;

use tramita_core::Result;
use tramita_domain::{ChatMessage, ChatSession, SessionStore};

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Create a session. A duplicate `session_id` is a distinct error
    /// (`Error::DuplicateSession`), not a transient store failure.
    pub async fn create_session(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        metadata: Option<serde_json::Value>,
    ) -> Result<ChatSession> {
        info!("Creating new chat session: {}", session_id);
        self.store.create_session(session_id, user_id, metadata).await
    }

    /// Fetch a session with its full message history.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        self.store.get_session(session_id).await
    }

    pub async fn session_exists(&self, session_id: &str) -> Result<bool> {
        self.store.session_exists(session_id).await
    }

    /// Append a message to an existing session.
    pub async fn add_message(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        self.store.add_message(session_id, message).await
    }

    /// The most recent `limit` messages, oldest first.
    pub async fn get_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        self.store.get_messages(session_id, limit).await
    }

    /// Delete a session and all its messages. Returns whether it existed.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        info!("Deleting session: {}", session_id);
        self.store.delete_session(session_id).await
    }

    /// Drop a session's messages but keep the session itself.
    pub async fn clear_history(&self, session_id: &str) -> Result<bool> {
        info!("Clearing history for session: {}", session_id);
        self.store.clear_history(session_id).await
    }

    /// Sessions ordered most-recently-updated first; messages are not
    /// loaded, listing stays cheap.
    pub async fn list_sessions(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ChatSession>> {
        self.store.list_sessions(user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySessionStore;
    use tramita_core::Error;
    use tramita_domain::Role;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let manager = manager();
        manager.create_session("s1", Some("u1"), None).await.unwrap();
        assert!(manager.session_exists("s1").await.unwrap());

        let err = manager.create_session("s1", None, None).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateSession(_)));
    }

    #[tokio::test]
    async fn test_message_flow_and_clear() {
        let manager = manager();
        manager.create_session("s1", None, None).await.unwrap();
        manager
            .add_message("s1", &ChatMessage::new(Role::User, "hola").unwrap())
            .await
            .unwrap();
        manager
            .add_message("s1", &ChatMessage::new(Role::Assistant, "buenas").unwrap())
            .await
            .unwrap();

        let messages = manager.get_messages("s1", 10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hola");

        assert!(manager.clear_history("s1").await.unwrap());
        assert!(manager.get_messages("s1", 10).await.unwrap().is_empty());
        assert!(manager.session_exists("s1").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_message_to_missing_session_fails() {
        let manager = manager();
        let err = manager
            .add_message("nope", &ChatMessage::new(Role::User, "hola").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_returns_whether_existed() {
        let manager = manager();
        manager.create_session("s1", None, None).await.unwrap();
        assert!(manager.delete_session("s1").await.unwrap());
        assert!(!manager.delete_session("s1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_user() {
        let manager = manager();
        manager.create_session("a", Some("u1"), None).await.unwrap();
        manager.create_session("b", Some("u2"), None).await.unwrap();

        assert_eq!(manager.list_sessions(None, 10).await.unwrap().len(), 2);
        let u1 = manager.list_sessions(Some("u1"), 10).await.unwrap();
        assert_eq!(u1.len(), 1);
        assert_eq!(u1[0].session_id, "a");
    }
}

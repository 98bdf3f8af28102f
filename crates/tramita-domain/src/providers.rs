//! Capability contracts the query engine depends on.
//!
//! Each contract is a polymorphic capability consumed as `Arc<dyn _>`; the
//! concrete providers live in `tramita-ai` (Gemini) and `tramita-store`
//! (SQLite). The engine never sees an implementation type.

use std::time::Duration;

use async_trait::async_trait;

use crate::chat::{ChatMessage, ChatSession};
use crate::feedback::{ExactitudMetrics, Feedback, FeedbackUpdate};
use crate::query::{RetrievedChunk, Statistics};
use tramita_core::Result;

/// Text → fixed-dimension embedding vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a document chunk for indexing.
    async fn embed_document(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of documents sequentially, pausing `delay` between
    /// calls to respect provider rate limits.
    async fn embed_batch(&self, texts: &[String], delay: Duration) -> Result<Vec<Vec<f32>>>;
}

/// Similarity search over stored chunk embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return up to `limit` chunks with cosine similarity ≥ `threshold`,
    /// ordered by descending similarity.
    async fn search_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>>;

    async fn document_count(&self) -> Result<i64>;

    async fn chunk_count(&self) -> Result<i64>;

    async fn statistics(&self) -> Result<Statistics>;
}

/// Answer generation with a language model.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate an answer grounded in `context`. `history`, when present, is
    /// a rendered conversation transcript injected ahead of the context.
    async fn generate_answer(
        &self,
        query: &str,
        context: &str,
        system_prompt: Option<&str>,
        history: Option<&str>,
    ) -> Result<String>;

    /// Free-form text generation.
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

/// Persistence for conversation sessions and their messages.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session. Fails with `Error::DuplicateSession` if `session_id`
    /// is already taken.
    async fn create_session(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        metadata: Option<serde_json::Value>,
    ) -> Result<ChatSession>;

    /// Fetch a session with its full message history, or `None`.
    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>>;

    async fn session_exists(&self, session_id: &str) -> Result<bool>;

    /// Append a message. Fails if the session does not exist.
    async fn add_message(&self, session_id: &str, message: &ChatMessage) -> Result<()>;

    /// The most recent `limit` messages, oldest first.
    async fn get_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>>;

    /// Delete a session and its messages. Returns whether a row existed.
    async fn delete_session(&self, session_id: &str) -> Result<bool>;

    /// Remove all messages but keep the session. Returns whether the session
    /// existed.
    async fn clear_history(&self, session_id: &str) -> Result<bool>;

    /// Sessions ordered most-recently-updated first, messages not loaded.
    async fn list_sessions(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<ChatSession>>;
}

/// Persistence for answer feedback and the exactitud rollup.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn save_feedback(&self, feedback: Feedback) -> Result<Feedback>;

    /// Apply a partial update to the feedback for `message_id`. Returns
    /// whether a row matched.
    async fn update_feedback(&self, message_id: &str, update: &FeedbackUpdate) -> Result<bool>;

    async fn feedback_by_message(&self, message_id: &str) -> Result<Option<Feedback>>;

    /// Accuracy metrics over feedback created in the trailing `days` window.
    async fn exactitud_metrics(&self, days: i64) -> Result<ExactitudMetrics>;
}

//! The query orchestrator.
//!
//! One `execute` call runs the full pipeline: special-command interception,
//! best-effort history load, embedding, retrieval, context assembly, answer
//! generation, and best-effort history persistence. Embedding, retrieval,
//! and generation failures abort the query; history failures only degrade
//! it.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::sessions::SessionManager;
use crate::templates;
use tramita_core::{Error, Result};
use tramita_domain::{
    render_transcript, ChatMessage, ChatProvider, EmbeddingProvider, QueryResult, RetrievedChunk,
    Role, SimilarChunk, VectorStore,
};

const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.4;
const DEFAULT_TOP_K: usize = 5;
const DEFAULT_MAX_HISTORY_MESSAGES: usize = 10;

/// Sequences one retrieval-augmented query against injected capability
/// providers.
pub struct QueryEngine {
    embeddings: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatProvider>,
    sessions: Arc<SessionManager>,
    similarity_threshold: f32,
    top_k: usize,
    max_history_messages: usize,
}

impl QueryEngine {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatProvider>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self::with_settings(
            embeddings,
            index,
            chat,
            sessions,
            DEFAULT_SIMILARITY_THRESHOLD,
            DEFAULT_TOP_K,
            DEFAULT_MAX_HISTORY_MESSAGES,
        )
    }

    pub fn with_settings(
        embeddings: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatProvider>,
        sessions: Arc<SessionManager>,
        similarity_threshold: f32,
        top_k: usize,
        max_history_messages: usize,
    ) -> Self {
        Self {
            embeddings,
            index,
            chat,
            sessions,
            similarity_threshold,
            top_k,
            max_history_messages,
        }
    }

    /// Run one query, optionally inside the conversation `session_id`.
    pub async fn execute(&self, query: &str, session_id: Option<&str>) -> Result<QueryResult> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query must not be empty".into()));
        }

        info!("Processing query: '{}'", query);

        if let Some(result) = templates::intercept(query) {
            info!("Special command matched: {:?}", result.document_name);
            return Ok(result);
        }

        let history = match session_id {
            Some(id) => self.load_history(id).await,
            None => String::new(),
        };

        let embedding = self.embeddings.embed_query(query).await?;
        debug!("Generated query embedding with {} dimensions", embedding.len());

        let chunks = self
            .index
            .search_similar(&embedding, self.similarity_threshold, self.top_k)
            .await?;
        info!(
            "Found {} similar chunks (threshold={}, limit={})",
            chunks.len(),
            self.similarity_threshold,
            self.top_k
        );

        if chunks.is_empty() {
            warn!("No similar chunks found for query");
            return Ok(QueryResult {
                query: query.to_string(),
                answer: templates::NO_RESULTS_MESSAGE.to_string(),
                sources: Vec::new(),
                similar_chunks: Vec::new(),
                document_name: None,
                download_url: None,
            });
        }

        let context = build_context(&chunks);
        debug!("Context built: {} characters", context.len());

        let history_ref = if history.is_empty() {
            None
        } else {
            Some(history.as_str())
        };
        let answer = self
            .chat
            .generate_answer(query, &context, None, history_ref)
            .await?;
        debug!("Answer generated: {} characters", answer.len());

        let sources = distinct_sources(&chunks);
        let document_name = sources.first().cloned();

        if let Some(id) = session_id {
            self.persist_turn(id, query, &answer, &sources).await;
        }

        Ok(QueryResult {
            query: query.to_string(),
            answer,
            sources,
            similar_chunks: chunks.into_iter().map(SimilarChunk::from).collect(),
            document_name,
            download_url: None,
        })
    }

    /// Best-effort history load: any failure degrades to an empty history
    /// instead of failing the query.
    async fn load_history(&self, session_id: &str) -> String {
        match self.try_load_history(session_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to load history for session {}: {}", session_id, e);
                String::new()
            }
        }
    }

    async fn try_load_history(&self, session_id: &str) -> Result<String> {
        if !self.sessions.session_exists(session_id).await? {
            self.sessions.create_session(session_id, None, None).await?;
            return Ok(String::new());
        }
        let messages = self
            .sessions
            .get_messages(session_id, self.max_history_messages)
            .await?;
        Ok(render_transcript(&messages))
    }

    /// Best-effort turn persistence: an unsaved turn must never fail the
    /// user-visible response.
    async fn persist_turn(&self, session_id: &str, query: &str, answer: &str, sources: &[String]) {
        if let Err(e) = self.try_persist_turn(session_id, query, answer, sources).await {
            warn!(
                "Failed to persist conversation turn for session {}: {}",
                session_id, e
            );
        }
    }

    async fn try_persist_turn(
        &self,
        session_id: &str,
        query: &str,
        answer: &str,
        sources: &[String],
    ) -> Result<()> {
        if !self.sessions.session_exists(session_id).await? {
            self.sessions.create_session(session_id, None, None).await?;
        }

        let user_message = ChatMessage::new(Role::User, query)?;
        self.sessions.add_message(session_id, &user_message).await?;

        let assistant_message = ChatMessage::new(Role::Assistant, answer)?
            .with_metadata(json!({ "sources": sources }));
        self.sessions.add_message(session_id, &assistant_message).await?;
        Ok(())
    }
}

/// Concatenate retrieved chunks into the prompt context, in retrieval
/// order. The labeling is a compatibility contract; reproduce it exactly.
fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Source {}: {}]\n{}\n", i + 1, chunk.filename, chunk.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Distinct source filenames, first-by-retrieval-rank order.
fn distinct_sources(chunks: &[RetrievedChunk]) -> Vec<String> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter(|c| seen.insert(c.filename.clone()))
        .map(|c| c.filename.clone())
        .collect()
}

//! Configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level Tramita configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TramitaConfig {
    /// HTTP server port.
    pub port: u16,
    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,
    /// Gemini API key (`GEMINI_API_KEY`).
    pub gemini_api_key: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Chat model name.
    pub chat_model: String,
    /// Embedding dimension (768 for text-embedding-004).
    pub embedding_dim: usize,
    /// Minimum cosine similarity a chunk must reach to be retrieved.
    pub similarity_threshold: f32,
    /// Maximum number of chunks retrieved per query.
    pub top_k: usize,
    /// Maximum conversation-history messages fed back into a query.
    pub max_history_messages: usize,
}

impl TramitaConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY is not set".into()))?;

        let embedding_model = std::env::var("GEMINI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-004".to_string());
        let chat_model = std::env::var("GEMINI_CHAT_MODEL")
            .unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string());

        let similarity_threshold = std::env::var("RAG_SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.4);
        let top_k = std::env::var("RAG_TOP_K_RESULTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let max_history_messages = std::env::var("RAG_MAX_HISTORY_MESSAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            port,
            data_dir: data_dir.as_ref().to_path_buf(),
            gemini_api_key,
            embedding_model,
            chat_model,
            embedding_dim: 768,
            similarity_threshold,
            top_k,
            max_history_messages,
        })
    }
}

//! Municipal documents and their chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A processed municipal document. Created once at ingestion time and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    /// "ley", "ordenanza", "decreto", "reglamento", "formulario", "guia", ...
    pub document_type: String,
    /// "normativa", "comercio", "informacion", "general", ...
    pub category: String,
    pub total_pages: i32,
    /// Uniquely identifies content; used for de-duplication upstream.
    pub file_hash: String,
    pub created_at: DateTime<Utc>,
    pub processing_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<i64>,
}

const LEGAL_TYPES: [&str; 4] = ["ley", "ordenanza", "decreto", "reglamento"];
const SMALL_DOC_TYPES: [&str; 3] = ["formulario", "guia", "documento_general"];

impl Document {
    pub fn is_legal_document(&self) -> bool {
        LEGAL_TYPES.contains(&self.document_type.as_str())
    }

    pub fn is_small_document(&self) -> bool {
        self.total_pages <= 5
    }

    /// Legal documents are chunked article by article.
    pub fn should_chunk_by_articles(&self) -> bool {
        self.is_legal_document()
    }

    /// Short forms, guides and general documents stay whole.
    pub fn should_keep_as_single_chunk(&self) -> bool {
        self.is_small_document() && SMALL_DOC_TYPES.contains(&self.document_type.as_str())
    }
}

/// A fragment of a document together with its embedding vector. Owned by its
/// parent document; never mutated after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub text: String,
    pub page_number: i32,
    pub chunk_index: i32,
    pub embedding: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl DocumentChunk {
    pub fn embedding_dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Check the embedding against the configured model dimension
    /// (768 for text-embedding-004).
    pub fn validate_embedding_dimension(&self, expected: usize) -> bool {
        self.embedding_dimension() == expected
    }

    pub fn has_valid_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

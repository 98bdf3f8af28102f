//! Ephemeral query/search result objects and store statistics.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// One chunk record as returned by a vector search, ordered by the store in
/// descending similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub filename: String,
    pub document_id: String,
    pub page_number: i32,
    pub similarity: f32,
}

/// A retrieved chunk enriched for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarChunk {
    pub text: String,
    pub document_name: String,
    pub document_id: String,
    pub page_number: i32,
    /// Cosine similarity in [0, 1].
    pub similarity_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl From<RetrievedChunk> for SimilarChunk {
    fn from(chunk: RetrievedChunk) -> Self {
        Self {
            text: chunk.text,
            document_name: chunk.filename,
            document_id: chunk.document_id,
            page_number: chunk.page_number,
            similarity_score: chunk.similarity,
            metadata: None,
        }
    }
}

/// The outcome of one RAG query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    pub answer: String,
    pub sources: Vec<String>,
    pub similar_chunks: Vec<SimilarChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl QueryResult {
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Distinct cited documents (order unspecified).
    pub fn unique_documents(&self) -> Vec<String> {
        let set: HashSet<&String> = self.sources.iter().collect();
        set.into_iter().cloned().collect()
    }

    /// Mean similarity of the retrieved chunks, 0.0 when none were retrieved.
    pub fn average_similarity(&self) -> f32 {
        if self.similar_chunks.is_empty() {
            return 0.0;
        }
        let total: f32 = self.similar_chunks.iter().map(|c| c.similarity_score).sum();
        total / self.similar_chunks.len() as f32
    }
}

/// Aggregated store statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_documents: i64,
    pub total_chunks: i64,
    pub total_pages: i64,
    pub categories: HashMap<String, i64>,
    pub document_types: HashMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(score: f32) -> SimilarChunk {
        SimilarChunk {
            text: "texto".into(),
            document_name: "doc.pdf".into(),
            document_id: "d1".into(),
            page_number: 1,
            similarity_score: score,
            metadata: None,
        }
    }

    #[test]
    fn test_average_similarity() {
        let result = QueryResult {
            query: "q".into(),
            answer: "a".into(),
            sources: vec![],
            similar_chunks: vec![chunk(0.8), chunk(0.6), chunk(0.4)],
            document_name: None,
            download_url: None,
        };
        assert!((result.average_similarity() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_average_similarity_empty() {
        let result = QueryResult {
            query: "q".into(),
            answer: "a".into(),
            sources: vec![],
            similar_chunks: vec![],
            document_name: None,
            download_url: None,
        };
        assert_eq!(result.average_similarity(), 0.0);
        assert!(!result.has_sources());
    }

    #[test]
    fn test_unique_documents() {
        let result = QueryResult {
            query: "q".into(),
            answer: "a".into(),
            sources: vec!["a.pdf".into(), "b.pdf".into(), "a.pdf".into()],
            similar_chunks: vec![],
            document_name: Some("a.pdf".into()),
            download_url: None,
        };
        let mut unique = result.unique_documents();
        unique.sort();
        assert_eq!(unique, vec!["a.pdf".to_string(), "b.pdf".to_string()]);
        assert!(result.has_sources());
    }
}

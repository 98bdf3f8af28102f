//! Error types for Tramita.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Embedding generation failed: {0}")]
    EmbeddingGeneration(String),

    #[error("Vector search failed: {0}")]
    VectorSearch(String),

    #[error("Chat generation failed: {0}")]
    ChatGeneration(String),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Session already exists: {0}")]
    DuplicateSession(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Duplicate document: hash={0}")]
    DuplicateDocument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable tag exposed as the `type` field of HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmbeddingGeneration(_) => "EmbeddingGenerationError",
            Self::VectorSearch(_) => "VectorSearchError",
            Self::ChatGeneration(_) => "ChatGenerationError",
            Self::SessionStore(_) => "SessionStoreError",
            Self::DuplicateSession(_) => "SessionAlreadyExists",
            Self::VectorStore(_) | Self::DuplicateDocument(_) => "VectorStoreError",
            Self::NotFound(_) => "NotFound",
            Self::Validation(_) => "ValidationError",
            Self::Config(_) => "ConfigurationError",
            Self::Io(_) | Self::Json(_) => "InternalServerError",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(
            Error::EmbeddingGeneration("x".into()).kind(),
            "EmbeddingGenerationError"
        );
        assert_eq!(Error::VectorSearch("x".into()).kind(), "VectorSearchError");
        assert_eq!(Error::ChatGeneration("x".into()).kind(), "ChatGenerationError");
        assert_eq!(Error::SessionStore("x".into()).kind(), "SessionStoreError");
        assert_eq!(Error::DuplicateSession("s".into()).kind(), "SessionAlreadyExists");
        assert_eq!(Error::Validation("x".into()).kind(), "ValidationError");
    }
}

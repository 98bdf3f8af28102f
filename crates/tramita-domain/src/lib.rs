//! Tramita Domain — entities and capability contracts.
//!
//! Everything here is either a passive data holder with invariant checks or
//! an abstract contract one of the concrete providers fills in. No
//! infrastructure dependencies.

pub mod chat;
pub mod document;
pub mod feedback;
pub mod providers;
pub mod query;

pub use chat::{render_transcript, ChatMessage, ChatSession, Role};
pub use document::{Document, DocumentChunk};
pub use feedback::{ExactitudMetrics, Feedback, FeedbackUpdate};
pub use providers::{ChatProvider, EmbeddingProvider, FeedbackStore, SessionStore, VectorStore};
pub use query::{QueryResult, RetrievedChunk, SimilarChunk, Statistics};

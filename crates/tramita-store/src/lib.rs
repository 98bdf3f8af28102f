//! Tramita Store — SQLite-backed persistence for documents, chunk
//! embeddings, chat sessions, and feedback.
//!
//! One store fills the `VectorStore`, `SessionStore`, and `FeedbackStore`
//! contracts over a single database file.

pub mod embedding;
pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteStore;

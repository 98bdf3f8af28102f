//! Tramita AI — Gemini-backed embedding and chat providers.
//!
//! Both providers talk to the Generative Language REST API with plain JSON
//! requests; no SDK, no streaming.

pub mod chat;
pub mod embedding;

pub use chat::GeminiChat;
pub use embedding::GeminiEmbeddings;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

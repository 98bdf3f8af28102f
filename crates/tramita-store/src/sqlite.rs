//! SQLite store for documents, chunk embeddings, sessions, and feedback.
//!
//! Vector search runs against a pre-loaded, row-normalized embedding matrix
//! so a query is one dot product plus a handful of row fetches.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{blob_to_embedding, embedding_to_blob};
use crate::schema::SCHEMA_SQL;
use tramita_core::{Error, Result};
use tramita_domain::{
    ChatMessage, ChatSession, Document, DocumentChunk, ExactitudMetrics, Feedback, FeedbackStore,
    FeedbackUpdate, RetrievedChunk, Role, SessionStore, Statistics, VectorStore,
};

const MISSING_CATEGORY: &str = "no category";
const MISSING_TYPE: &str = "no type";

/// SQLite store backing the vector-store, session-store, and feedback-store
/// contracts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    embedding_dim: usize,
    /// Normalized chunk embeddings, shape (N, dim), for cosine search.
    embedding_matrix: Mutex<EmbeddingMatrix>,
}

struct EmbeddingMatrix {
    matrix: Array2<f32>,
    /// Chunk IDs corresponding to each row.
    chunk_ids: Vec<String>,
    dirty: bool,
}

impl SqliteStore {
    /// Open or create the store. `db_dir` is a directory; the database file
    /// is `db_dir/tramita.db`.
    pub fn open(db_dir: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let db_path = db_dir.join("tramita.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::VectorStore(format!("schema init failed: {e}")))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            embedding_dim,
            embedding_matrix: Mutex::new(EmbeddingMatrix {
                matrix: Array2::zeros((0, embedding_dim)),
                chunk_ids: Vec::new(),
                dirty: true,
            }),
        };

        store.load_embedding_matrix()?;

        let doc_count = store.count_documents()?;
        let chunk_count = store.count_chunks()?;
        info!(
            "SqliteStore initialized: {} documents, {} chunks, dim={}, path={}",
            doc_count,
            chunk_count,
            embedding_dim,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn =
            Connection::open(db_path).map_err(|e| Error::VectorStore(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(conn)
    }

    // ---------------------------------------------------------------
    // Document / chunk ingestion
    // ---------------------------------------------------------------

    /// Insert a document. Fails with `DuplicateDocument` when `file_hash` is
    /// already stored.
    pub fn add_document(&self, document: &Document) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO documents (id, filename, document_type, category, total_pages, \
             file_hash, created_at, processing_status, total_chunks) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?
        .execute(params![
            document.id,
            document.filename,
            document.document_type,
            document.category,
            document.total_pages,
            document.file_hash,
            document.created_at.timestamp_millis(),
            document.processing_status,
            document.total_chunks,
        ])
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                Error::DuplicateDocument(document.file_hash.clone())
            } else {
                Error::VectorStore(e.to_string())
            }
        })?;
        Ok(())
    }

    /// Insert a chunk with its embedding and invalidate the search matrix.
    pub fn add_chunk(&self, chunk: &DocumentChunk) -> Result<()> {
        if chunk.embedding.len() != self.embedding_dim {
            return Err(Error::VectorStore(format!(
                "embedding has {} dimensions, store expects {}",
                chunk.embedding.len(),
                self.embedding_dim
            )));
        }
        let meta_json = chunk
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m))
            .transpose()?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO document_chunks (id, document_id, text, page_number, chunk_index, \
             embedding, metadata_json, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?
        .execute(params![
            chunk.id,
            chunk.document_id,
            chunk.text,
            chunk.page_number,
            chunk.chunk_index,
            embedding_to_blob(&chunk.embedding),
            meta_json,
            now_millis(),
        ])
        .map_err(|e| Error::VectorStore(e.to_string()))?;
        drop(conn);

        self.embedding_matrix.lock().dirty = true;
        Ok(())
    }

    pub fn get_document(&self, document_id: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached("SELECT * FROM documents WHERE id = ?1")
            .map_err(|e| Error::VectorStore(e.to_string()))?
            .query_row(params![document_id], row_to_document)
            .optional()
            .map_err(|e| Error::VectorStore(e.to_string()));
        result
    }

    fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::VectorStore(e.to_string()))
    }

    fn count_chunks(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM document_chunks", [], |row| row.get(0))
            .map_err(|e| Error::VectorStore(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Embedding matrix
    // ---------------------------------------------------------------

    /// Load all chunk embeddings, row-normalized, into the search matrix.
    fn load_embedding_matrix(&self) -> Result<()> {
        let mut chunk_ids = Vec::new();
        let mut embeddings: Vec<Array1<f32>> = Vec::new();

        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare("SELECT id, embedding FROM document_chunks")
                .map_err(|e| Error::VectorStore(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    let id: String = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    Ok((id, blob))
                })
                .map_err(|e| Error::VectorStore(e.to_string()))?;

            for row in rows {
                let (id, blob) = row.map_err(|e| Error::VectorStore(e.to_string()))?;
                chunk_ids.push(id);
                embeddings.push(blob_to_embedding(&blob));
            }
        }

        let mut mat = self.embedding_matrix.lock();
        if embeddings.is_empty() {
            mat.matrix = Array2::zeros((0, self.embedding_dim));
            mat.chunk_ids = Vec::new();
            mat.dirty = false;
            return Ok(());
        }

        let n = embeddings.len();
        let mut matrix = Array2::zeros((n, self.embedding_dim));
        for (i, emb) in embeddings.iter().enumerate() {
            matrix.row_mut(i).assign(emb);
        }
        for mut row in matrix.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 1e-9 {
                row /= norm;
            }
        }

        mat.matrix = matrix;
        mat.chunk_ids = chunk_ids;
        mat.dirty = false;
        debug!("Loaded {} embeddings into matrix", n);
        Ok(())
    }

    fn ensure_matrix_loaded(&self) -> Result<()> {
        if self.embedding_matrix.lock().dirty {
            self.load_embedding_matrix()?;
        }
        Ok(())
    }

    fn fetch_retrieved_chunk(&self, chunk_id: &str, similarity: f32) -> Result<Option<RetrievedChunk>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT c.text, c.page_number, c.document_id, d.filename \
                 FROM document_chunks c JOIN documents d ON d.id = c.document_id \
                 WHERE c.id = ?1",
            )
            .map_err(|e| Error::VectorSearch(e.to_string()))?
            .query_row(params![chunk_id], |row| {
                Ok(RetrievedChunk {
                    text: row.get(0)?,
                    page_number: row.get(1)?,
                    document_id: row.get(2)?,
                    filename: row.get(3)?,
                    similarity,
                })
            })
            .optional()
            .map_err(|e| Error::VectorSearch(e.to_string()));
        result
    }

    // ---------------------------------------------------------------
    // Session helpers
    // ---------------------------------------------------------------

    fn session_row(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached("SELECT * FROM chat_sessions WHERE session_id = ?1")
            .map_err(|e| Error::SessionStore(e.to_string()))?
            .query_row(params![session_id], row_to_session)
            .optional()
            .map_err(|e| Error::SessionStore(e.to_string()));
        result
    }

    /// Bump a session's `updated_at`, always strictly forward.
    fn touch_session(&self, conn: &Connection, session_id: &str) -> Result<()> {
        conn.execute(
            "UPDATE chat_sessions SET updated_at = \
             CASE WHEN ?1 > updated_at THEN ?1 ELSE updated_at + 1 END \
             WHERE session_id = ?2",
            params![now_millis(), session_id],
        )
        .map_err(|e| Error::SessionStore(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn search_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        if embedding.len() != self.embedding_dim {
            return Err(Error::VectorSearch(format!(
                "query embedding has {} dimensions, store expects {}",
                embedding.len(),
                self.embedding_dim
            )));
        }
        self.ensure_matrix_loaded()?;

        let scored: Vec<(String, f32)> = {
            let mat = self.embedding_matrix.lock();
            if mat.matrix.nrows() == 0 {
                return Ok(Vec::new());
            }

            let query = Array1::from_vec(embedding.to_vec());
            let q_norm = query.dot(&query).sqrt();
            if q_norm < 1e-9 {
                return Ok(Vec::new());
            }
            let query = query / q_norm;

            let similarities = mat.matrix.dot(&query);
            let mut scored: Vec<(usize, f32)> = similarities
                .iter()
                .enumerate()
                .map(|(i, &s)| (i, s))
                .filter(|&(_, s)| s >= threshold)
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(limit);

            scored
                .into_iter()
                .map(|(i, s)| (mat.chunk_ids[i].clone(), s))
                .collect()
        };

        let mut results = Vec::with_capacity(scored.len());
        for (chunk_id, similarity) in scored {
            if let Some(chunk) = self.fetch_retrieved_chunk(&chunk_id, similarity)? {
                results.push(chunk);
            }
        }
        Ok(results)
    }

    async fn document_count(&self) -> Result<i64> {
        self.count_documents()
    }

    async fn chunk_count(&self) -> Result<i64> {
        self.count_chunks()
    }

    async fn statistics(&self) -> Result<Statistics> {
        let total_chunks = self.count_chunks()?;

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT category, document_type, total_pages FROM documents")
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let category: Option<String> = row.get(0)?;
                let document_type: Option<String> = row.get(1)?;
                let total_pages: i64 = row.get(2)?;
                Ok((category, document_type, total_pages))
            })
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        let mut total_documents = 0;
        let mut total_pages = 0;
        let mut categories: HashMap<String, i64> = HashMap::new();
        let mut document_types: HashMap<String, i64> = HashMap::new();

        for row in rows {
            let (category, document_type, pages) =
                row.map_err(|e| Error::VectorStore(e.to_string()))?;
            total_documents += 1;
            total_pages += pages;

            let category = non_blank(category, MISSING_CATEGORY);
            *categories.entry(category).or_insert(0) += 1;

            let document_type = non_blank(document_type, MISSING_TYPE);
            *document_types.entry(document_type).or_insert(0) += 1;
        }

        Ok(Statistics {
            total_documents,
            total_chunks,
            total_pages,
            categories,
            document_types,
        })
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn create_session(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        metadata: Option<serde_json::Value>,
    ) -> Result<ChatSession> {
        let mut session = ChatSession::new(session_id)?;
        session.user_id = user_id.map(str::to_string);
        session.metadata = metadata;

        let meta_json = session
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m))
            .transpose()?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO chat_sessions (session_id, user_id, metadata_json, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| Error::SessionStore(e.to_string()))?
        .execute(params![
            session.session_id,
            session.user_id,
            meta_json,
            session.created_at.timestamp_millis(),
            session.updated_at.timestamp_millis(),
        ])
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                Error::DuplicateSession(session_id.to_string())
            } else {
                Error::SessionStore(e.to_string())
            }
        })?;

        debug!("Created chat session {}", session.session_id);
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let mut session = match self.session_row(session_id)? {
            Some(s) => s,
            None => return Ok(None),
        };
        // full history, oldest first
        session.messages = self.get_messages(session_id, 0).await?;
        Ok(Some(session))
    }

    async fn session_exists(&self, session_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let found: Option<i64> = conn
            .prepare_cached("SELECT 1 FROM chat_sessions WHERE session_id = ?1")
            .map_err(|e| Error::SessionStore(e.to_string()))?
            .query_row(params![session_id], |row| row.get(0))
            .optional()
            .map_err(|e| Error::SessionStore(e.to_string()))?;
        Ok(found.is_some())
    }

    async fn add_message(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        if !self.session_exists(session_id).await? {
            return Err(Error::NotFound(format!("session {session_id}")));
        }

        let meta_json = message
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m))
            .transpose()?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO chat_messages (session_id, role, content, metadata_json, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| Error::SessionStore(e.to_string()))?
        .execute(params![
            session_id,
            message.role.as_str(),
            message.content,
            meta_json,
            message.created_at.timestamp_millis(),
        ])
        .map_err(|e| Error::SessionStore(e.to_string()))?;

        self.touch_session(&conn, session_id)
    }

    async fn get_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let conn = self.conn.lock();
        // take the most recent `limit` rows, then restore chronological order
        let sql = if limit > 0 {
            "SELECT role, content, metadata_json, created_at FROM chat_messages \
             WHERE session_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2"
        } else {
            "SELECT role, content, metadata_json, created_at FROM chat_messages \
             WHERE session_id = ?1 ORDER BY created_at DESC, id DESC LIMIT -1"
        };
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| Error::SessionStore(e.to_string()))?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<ChatMessage> {
            let role: String = row.get(0)?;
            let content: String = row.get(1)?;
            let metadata: Option<String> = row.get(2)?;
            let created_at: i64 = row.get(3)?;
            Ok(ChatMessage {
                role: role.parse::<Role>().unwrap_or(Role::System),
                content,
                created_at: millis_to_datetime(created_at),
                metadata: metadata.and_then(|s| serde_json::from_str(&s).ok()),
            })
        };

        let rows = if limit > 0 {
            stmt.query_map(params![session_id, limit as i64], map_row)
        } else {
            stmt.query_map(params![session_id], map_row)
        }
        .map_err(|e| Error::SessionStore(e.to_string()))?;

        let mut messages: Vec<ChatMessage> = rows
            .collect::<rusqlite::Result<_>>()
            .map_err(|e| Error::SessionStore(e.to_string()))?;
        messages.reverse();
        Ok(messages)
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "DELETE FROM chat_sessions WHERE session_id = ?1",
                params![session_id],
            )
            .map_err(|e| Error::SessionStore(e.to_string()))?;
        Ok(count > 0)
    }

    async fn clear_history(&self, session_id: &str) -> Result<bool> {
        if !self.session_exists(session_id).await? {
            return Ok(false);
        }
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM chat_messages WHERE session_id = ?1",
            params![session_id],
        )
        .map_err(|e| Error::SessionStore(e.to_string()))?;
        self.touch_session(&conn, session_id)?;
        Ok(true)
    }

    async fn list_sessions(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<ChatSession>> {
        let conn = self.conn.lock();
        let sql = match user_id {
            Some(_) => {
                "SELECT * FROM chat_sessions WHERE user_id = ?1 \
                 ORDER BY updated_at DESC LIMIT ?2"
            }
            None => "SELECT * FROM chat_sessions ORDER BY updated_at DESC LIMIT ?1",
        };
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| Error::SessionStore(e.to_string()))?;

        let rows = match user_id {
            Some(uid) => stmt.query_map(params![uid, limit as i64], row_to_session),
            None => stmt.query_map(params![limit as i64], row_to_session),
        }
        .map_err(|e| Error::SessionStore(e.to_string()))?;

        rows.collect::<rusqlite::Result<_>>()
            .map_err(|e| Error::SessionStore(e.to_string()))
    }
}

#[async_trait]
impl FeedbackStore for SqliteStore {
    async fn save_feedback(&self, feedback: Feedback) -> Result<Feedback> {
        let sources_json = feedback
            .sources
            .as_ref()
            .map(|s| serde_json::to_string(s))
            .transpose()?;
        let meta_json = feedback
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m))
            .transpose()?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO rag_feedback (message_id, session_id, query, answer, is_correct, \
             rating, comment, sources_json, chunks_count, similarity_threshold, metadata_json, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .map_err(|e| Error::VectorStore(e.to_string()))?
        .execute(params![
            feedback.message_id,
            feedback.session_id,
            feedback.query,
            feedback.answer,
            feedback.is_correct,
            feedback.rating,
            feedback.comment,
            sources_json,
            feedback.chunks_count,
            feedback.similarity_threshold,
            meta_json,
            feedback.created_at.timestamp_millis(),
            feedback.updated_at.timestamp_millis(),
        ])
        .map_err(|e| Error::VectorStore(e.to_string()))?;

        debug!("Saved feedback for message {:?}", feedback.message_id);
        Ok(feedback)
    }

    async fn update_feedback(&self, message_id: &str, update: &FeedbackUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let conn = self.conn.lock();
        let count = conn
            .prepare_cached(
                "UPDATE rag_feedback SET \
                 is_correct = COALESCE(?1, is_correct), \
                 rating = COALESCE(?2, rating), \
                 comment = COALESCE(?3, comment), \
                 updated_at = ?4 \
                 WHERE message_id = ?5",
            )
            .map_err(|e| Error::VectorStore(e.to_string()))?
            .execute(params![
                update.is_correct,
                update.rating,
                update.comment,
                now_millis(),
                message_id,
            ])
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(count > 0)
    }

    async fn feedback_by_message(&self, message_id: &str) -> Result<Option<Feedback>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT * FROM rag_feedback WHERE message_id = ?1 \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .map_err(|e| Error::VectorStore(e.to_string()))?
            .query_row(params![message_id], row_to_feedback)
            .optional()
            .map_err(|e| Error::VectorStore(e.to_string()));
        result
    }

    async fn exactitud_metrics(&self, days: i64) -> Result<ExactitudMetrics> {
        let cutoff = now_millis() - days * 24 * 60 * 60 * 1000;

        let conn = self.conn.lock();
        let (total, correct, incorrect, unevaluated, avg_rating): (
            i64,
            Option<i64>,
            Option<i64>,
            Option<i64>,
            Option<f64>,
        ) = conn
            .prepare_cached(
                "SELECT COUNT(*), \
                 SUM(CASE WHEN is_correct = 1 THEN 1 ELSE 0 END), \
                 SUM(CASE WHEN is_correct = 0 THEN 1 ELSE 0 END), \
                 SUM(CASE WHEN is_correct IS NULL THEN 1 ELSE 0 END), \
                 AVG(rating) \
                 FROM rag_feedback WHERE created_at >= ?1",
            )
            .map_err(|e| Error::VectorStore(e.to_string()))?
            .query_row(params![cutoff], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        if total == 0 {
            return Ok(ExactitudMetrics::zeroed());
        }

        let correct = correct.unwrap_or(0);
        let incorrect = incorrect.unwrap_or(0);
        let unevaluated = unevaluated.unwrap_or(0);
        let evaluated = correct + incorrect;
        let percentage = if evaluated > 0 {
            correct as f64 / evaluated as f64 * 100.0
        } else {
            0.0
        };

        ExactitudMetrics::new(evaluated, correct, incorrect, unevaluated, percentage, avg_rating)
    }
}

// ---------------------------------------------------------------
// Row mappers and small helpers
// ---------------------------------------------------------------

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn non_blank(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get("id")?,
        filename: row.get("filename")?,
        document_type: row.get::<_, Option<String>>("document_type")?.unwrap_or_default(),
        category: row.get::<_, Option<String>>("category")?.unwrap_or_default(),
        total_pages: row.get("total_pages")?,
        file_hash: row.get::<_, Option<String>>("file_hash")?.unwrap_or_default(),
        created_at: millis_to_datetime(row.get("created_at")?),
        processing_status: row.get("processing_status")?,
        total_chunks: row.get("total_chunks")?,
    })
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatSession> {
    let metadata: Option<String> = row.get("metadata_json")?;
    Ok(ChatSession {
        session_id: row.get("session_id")?,
        messages: Vec::new(),
        created_at: millis_to_datetime(row.get("created_at")?),
        updated_at: millis_to_datetime(row.get("updated_at")?),
        user_id: row.get("user_id")?,
        metadata: metadata.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn row_to_feedback(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feedback> {
    let sources: Option<String> = row.get("sources_json")?;
    let metadata: Option<String> = row.get("metadata_json")?;
    Ok(Feedback {
        query: row.get("query")?,
        answer: row.get("answer")?,
        session_id: row.get("session_id")?,
        message_id: row.get("message_id")?,
        is_correct: row.get("is_correct")?,
        rating: row.get("rating")?,
        comment: row.get("comment")?,
        sources: sources.and_then(|s| serde_json::from_str(&s).ok()),
        chunks_count: row.get("chunks_count")?,
        similarity_threshold: row.get("similarity_threshold")?,
        created_at: millis_to_datetime(row.get("created_at")?),
        updated_at: millis_to_datetime(row.get("updated_at")?),
        metadata: metadata.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_store(dim: usize) -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path(), dim).unwrap();
        (store, dir)
    }

    fn doc(id: &str, filename: &str, category: &str, doc_type: &str, pages: i32) -> Document {
        Document {
            id: id.into(),
            filename: filename.into(),
            document_type: doc_type.into(),
            category: category.into(),
            total_pages: pages,
            file_hash: format!("hash-{id}"),
            created_at: Utc::now(),
            processing_status: "completed".into(),
            total_chunks: None,
        }
    }

    fn chunk(id: &str, doc_id: &str, text: &str, embedding: Vec<f32>) -> DocumentChunk {
        DocumentChunk {
            id: id.into(),
            document_id: doc_id.into(),
            text: text.into(),
            page_number: 1,
            chunk_index: 0,
            embedding,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (store, _dir) = test_store(4);

        let session = store.create_session("s1", Some("u1"), None).await.unwrap();
        assert_eq!(session.session_id, "s1");
        assert!(store.session_exists("s1").await.unwrap());
        assert!(!store.session_exists("nope").await.unwrap());

        // duplicate creation is a distinct error
        let err = store.create_session("s1", None, None).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateSession(_)));

        store
            .add_message("s1", &ChatMessage::new(Role::User, "hola").unwrap())
            .await
            .unwrap();
        store
            .add_message("s1", &ChatMessage::new(Role::Assistant, "buenas").unwrap())
            .await
            .unwrap();

        let fetched = store.get_session("s1").await.unwrap().unwrap();
        assert_eq!(fetched.message_count(), 2);
        assert_eq!(fetched.messages[0].role, Role::User);
        assert_eq!(fetched.messages[1].role, Role::Assistant);
        assert!(fetched.updated_at > fetched.created_at);

        assert!(store.clear_history("s1").await.unwrap());
        let cleared = store.get_session("s1").await.unwrap().unwrap();
        assert!(!cleared.has_messages());
        assert!(!store.clear_history("missing").await.unwrap());

        assert!(store.delete_session("s1").await.unwrap());
        assert!(!store.delete_session("s1").await.unwrap());
        assert!(store.get_session("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_message_requires_session() {
        let (store, _dir) = test_store(4);
        let err = store
            .add_message("missing", &ChatMessage::new(Role::User, "hola").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_messages_window() {
        let (store, _dir) = test_store(4);
        store.create_session("s1", None, None).await.unwrap();

        for i in 0..5i64 {
            let mut msg = ChatMessage::new(Role::User, format!("m{i}")).unwrap();
            // spread timestamps so ordering is unambiguous
            msg.created_at = Utc::now() + Duration::milliseconds(i * 10);
            store.add_message("s1", &msg).await.unwrap();
        }

        let window = store.get_messages("s1", 2).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "m3");
        assert_eq!(window[1].content, "m4");

        let all = store.get_messages("s1", 0).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].content, "m0");
    }

    #[tokio::test]
    async fn test_list_sessions_most_recent_first() {
        let (store, _dir) = test_store(4);
        store.create_session("a", Some("u1"), None).await.unwrap();
        store.create_session("b", Some("u1"), None).await.unwrap();
        store.create_session("c", Some("u2"), None).await.unwrap();

        // touching "a" moves it to the front
        store
            .add_message("a", &ChatMessage::new(Role::User, "hola").unwrap())
            .await
            .unwrap();

        let sessions = store.list_sessions(None, 50).await.unwrap();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].session_id, "a");
        // listing does not load messages
        assert!(sessions[0].messages.is_empty());

        let u1 = store.list_sessions(Some("u1"), 50).await.unwrap();
        assert_eq!(u1.len(), 2);
        assert!(u1.iter().all(|s| s.user_id.as_deref() == Some("u1")));
    }

    #[tokio::test]
    async fn test_vector_search_ordering_and_threshold() {
        let (store, _dir) = test_store(4);
        store.add_document(&doc("d1", "ley.pdf", "normativa", "ley", 10)).unwrap();
        store.add_document(&doc("d2", "guia.pdf", "informacion", "guia", 3)).unwrap();

        store.add_chunk(&chunk("c1", "d1", "texto uno", vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        store.add_chunk(&chunk("c2", "d1", "texto dos", vec![0.9, 0.1, 0.0, 0.0])).unwrap();
        store.add_chunk(&chunk("c3", "d2", "texto tres", vec![0.0, 1.0, 0.0, 0.0])).unwrap();

        let results = store
            .search_similar(&[1.0, 0.0, 0.0, 0.0], 0.5, 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "texto uno");
        assert!(results[0].similarity > results[1].similarity);
        assert_eq!(results[0].filename, "ley.pdf");

        // threshold filters the orthogonal chunk out entirely
        assert!(results.iter().all(|r| r.similarity >= 0.5));

        // limit caps the result count
        let limited = store
            .search_similar(&[1.0, 0.0, 0.0, 0.0], 0.0, 1)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_vector_search_empty_store() {
        let (store, _dir) = test_store(4);
        let results = store.search_similar(&[1.0, 0.0, 0.0, 0.0], 0.4, 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_document_hash() {
        let (store, _dir) = test_store(4);
        let mut a = doc("d1", "a.pdf", "normativa", "ley", 10);
        let mut b = doc("d2", "b.pdf", "normativa", "ley", 10);
        a.file_hash = "same".into();
        b.file_hash = "same".into();

        store.add_document(&a).unwrap();
        let err = store.add_document(&b).unwrap_err();
        assert!(matches!(err, Error::DuplicateDocument(_)));
    }

    #[tokio::test]
    async fn test_statistics_grouping_and_fallbacks() {
        let (store, _dir) = test_store(4);
        store.add_document(&doc("d1", "a.pdf", "normativa", "ley", 10)).unwrap();
        store.add_document(&doc("d2", "b.pdf", "normativa", "ordenanza", 5)).unwrap();
        store.add_document(&doc("d3", "c.pdf", "", "", 2)).unwrap();
        store.add_chunk(&chunk("c1", "d1", "t", vec![0.0; 4])).unwrap();

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.total_chunks, 1);
        assert_eq!(stats.total_pages, 17);
        assert_eq!(stats.categories.get("normativa"), Some(&2));
        assert_eq!(stats.categories.get("no category"), Some(&1));
        assert_eq!(stats.document_types.get("ley"), Some(&1));
        assert_eq!(stats.document_types.get("no type"), Some(&1));
    }

    #[tokio::test]
    async fn test_feedback_round_trip_and_update() {
        let (store, _dir) = test_store(4);

        let mut fb = Feedback::new("¿Qué es?", "Es...").unwrap();
        fb.message_id = Some("msg-1".into());
        fb.session_id = Some("s1".into());
        fb.sources = Some(vec!["a.pdf".into()]);
        store.save_feedback(fb).await.unwrap();

        let fetched = store.feedback_by_message("msg-1").await.unwrap().unwrap();
        assert_eq!(fetched.query, "¿Qué es?");
        assert_eq!(fetched.sources.as_deref(), Some(&["a.pdf".to_string()][..]));
        assert!(fetched.is_correct.is_none());

        let update = FeedbackUpdate {
            is_correct: Some(true),
            rating: Some(5),
            comment: None,
        };
        assert!(store.update_feedback("msg-1", &update).await.unwrap());
        let updated = store.feedback_by_message("msg-1").await.unwrap().unwrap();
        assert_eq!(updated.is_correct, Some(true));
        assert_eq!(updated.rating, Some(5));

        assert!(!store.update_feedback("missing", &update).await.unwrap());
        assert!(!store
            .update_feedback("msg-1", &FeedbackUpdate::default())
            .await
            .unwrap());
        assert!(store.feedback_by_message("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exactitud_metrics_window() {
        let (store, _dir) = test_store(4);

        let saved = |is_correct: Option<bool>, rating: Option<i32>, age_days: i64| {
            let mut fb = Feedback::new("q", "a").unwrap();
            fb.is_correct = is_correct;
            fb.rating = rating;
            fb.created_at = Utc::now() - Duration::days(age_days);
            fb.updated_at = fb.created_at;
            fb
        };

        store.save_feedback(saved(Some(true), Some(5), 1)).await.unwrap();
        store.save_feedback(saved(Some(true), Some(4), 2)).await.unwrap();
        store.save_feedback(saved(Some(false), None, 3)).await.unwrap();
        store.save_feedback(saved(None, None, 4)).await.unwrap();
        // outside the 30-day window
        store.save_feedback(saved(Some(false), Some(1), 40)).await.unwrap();

        let metrics = store.exactitud_metrics(30).await.unwrap();
        assert_eq!(metrics.total_evaluaciones, 3);
        assert_eq!(metrics.respuestas_correctas, 2);
        assert_eq!(metrics.respuestas_incorrectas, 1);
        assert_eq!(metrics.sin_evaluar, 1);
        assert!((metrics.exactitud_porcentaje - 66.6666).abs() < 0.01);
        assert!((metrics.rating_promedio.unwrap() - 4.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_exactitud_metrics_empty_window() {
        let (store, _dir) = test_store(4);
        let metrics = store.exactitud_metrics(30).await.unwrap();
        assert_eq!(metrics.total_evaluaciones, 0);
        assert_eq!(metrics.respuestas_correctas, 0);
        assert_eq!(metrics.respuestas_incorrectas, 0);
        assert_eq!(metrics.sin_evaluar, 0);
        assert_eq!(metrics.exactitud_porcentaje, 0.0);
        assert_eq!(metrics.rating_promedio, None);
    }
}

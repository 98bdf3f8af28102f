//! RAG query and statistics routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/query", post(query_rag))
        .route("/stats", get(get_statistics))
}

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

/// POST /api/query — run one RAG query, optionally inside a session.
async fn query_rag(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, Json<serde_json::Value>)> {
    let result = state
        .engine
        .execute(&request.query, request.session_id.as_deref())
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(QueryResponse {
        answer: result.answer,
        sources: result.sources,
        document_name: result.document_name,
        download_url: result.download_url,
    }))
}

/// GET /api/stats — aggregated document/chunk statistics.
async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let stats = state
        .stats
        .get_statistics()
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(serde_json::json!({
        "total_documents": stats.total_documents,
        "total_chunks": stats.total_chunks,
        "total_pages": stats.total_pages,
        "categories": stats.categories,
        "document_types": stats.document_types,
    })))
}

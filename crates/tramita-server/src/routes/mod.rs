//! HTTP route handlers.

pub mod feedback;
pub mod rag;
pub mod sessions;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::state::AppState;
use tramita_core::Error;
use tramita_domain::VectorStore;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health — liveness plus store visibility.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let documents = state.index.document_count().await.ok();
    let chunks = state.index.chunk_count().await.ok();

    Json(serde_json::json!({
        "status": if documents.is_some() { "healthy" } else { "degraded" },
        "app_name": "Tramita",
        "version": env!("CARGO_PKG_VERSION"),
        "total_documents": documents,
        "total_chunks": chunks,
    }))
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(rag::routes())
        .merge(sessions::routes())
        .merge(feedback::routes())
}

/// Map a domain error to an HTTP response with a stable `type` tag. Raw
/// provider/store detail goes to the log, never the client.
pub(crate) fn error_response(err: &Error) -> (StatusCode, Json<serde_json::Value>) {
    error!("{}: {}", err.kind(), err);
    let status = match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::DuplicateSession(_) | Error::DuplicateDocument(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let detail = match err {
        Error::EmbeddingGeneration(_) => "Failed to generate embeddings. Please try again.".into(),
        Error::VectorSearch(_) => "Failed to search knowledge base. Please try again.".into(),
        Error::ChatGeneration(_) => "Failed to generate response. Please try again.".into(),
        Error::Io(_) | Error::Json(_) => "An unexpected error occurred.".into(),
        other => other.to_string(),
    };
    (
        status,
        Json(serde_json::json!({ "detail": detail, "type": err.kind() })),
    )
}

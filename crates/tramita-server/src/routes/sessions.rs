//! Session management routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::routes::error_response;
use crate::state::AppState;
use tramita_domain::{ChatMessage, ChatSession};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/history", delete(clear_session_history))
}

type ErrorBody = (StatusCode, Json<serde_json::Value>);

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct ListSessionsParams {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ChatMessageResponse {
    pub role: String,
    pub content: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct ChatSessionResponse {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: usize,
    pub messages: Vec<ChatMessageResponse>,
}

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ChatSessionResponse>,
    pub total: usize,
}

#[derive(Serialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
}

fn message_response(message: &ChatMessage) -> ChatMessageResponse {
    ChatMessageResponse {
        role: message.role.to_string(),
        content: message.content.clone(),
        created_at: message.created_at.to_rfc3339(),
        metadata: message.metadata.clone(),
    }
}

fn session_response(session: &ChatSession, include_messages: bool) -> ChatSessionResponse {
    ChatSessionResponse {
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        created_at: session.created_at.to_rfc3339(),
        updated_at: session.updated_at.to_rfc3339(),
        message_count: session.message_count(),
        messages: if include_messages {
            session.messages.iter().map(message_response).collect()
        } else {
            Vec::new()
        },
    }
}

fn session_not_found(session_id: &str) -> ErrorBody {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "detail": format!("Session {session_id} not found"),
            "type": "NotFound",
        })),
    )
}

/// POST /api/sessions — create a session for conversation memory.
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ChatSessionResponse>), ErrorBody> {
    let session = state
        .sessions
        .create_session(
            &request.session_id,
            request.user_id.as_deref(),
            request.metadata,
        )
        .await
        .map_err(|e| error_response(&e))?;

    Ok((StatusCode::CREATED, Json(session_response(&session, true))))
}

/// GET /api/sessions/{id} — a session with its complete history.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatSessionResponse>, ErrorBody> {
    let session = state
        .sessions
        .get_session(&session_id)
        .await
        .map_err(|e| error_response(&e))?
        .ok_or_else(|| session_not_found(&session_id))?;

    Ok(Json(session_response(&session, true)))
}

/// GET /api/sessions — list sessions, most recently updated first.
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListSessionsParams>,
) -> Result<Json<SessionListResponse>, ErrorBody> {
    let sessions = state
        .sessions
        .list_sessions(params.user_id.as_deref(), params.limit.unwrap_or(50))
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(SessionListResponse {
        total: sessions.len(),
        sessions: sessions.iter().map(|s| session_response(s, false)).collect(),
    }))
}

/// DELETE /api/sessions/{id} — delete a session and all its messages.
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ErrorBody> {
    let deleted = state
        .sessions
        .delete_session(&session_id)
        .await
        .map_err(|e| error_response(&e))?;

    if !deleted {
        return Err(session_not_found(&session_id));
    }

    Ok(Json(DeleteSessionResponse {
        success: true,
        message: format!("Session {session_id} deleted successfully"),
        session_id,
    }))
}

/// DELETE /api/sessions/{id}/history — clear messages, keep the session.
async fn clear_session_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ErrorBody> {
    let cleared = state
        .sessions
        .clear_history(&session_id)
        .await
        .map_err(|e| error_response(&e))?;

    if !cleared {
        return Err(session_not_found(&session_id));
    }

    Ok(Json(DeleteSessionResponse {
        success: true,
        message: format!("History cleared for session {session_id}"),
        session_id,
    }))
}

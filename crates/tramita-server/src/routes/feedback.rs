//! Feedback routes — answer evaluation and exactitud metrics.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::routes::error_response;
use crate::state::AppState;
use tramita_engine::feedback::DEFAULT_METRICS_WINDOW_DAYS;
use tramita_domain::{Feedback, FeedbackUpdate};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feedback", post(submit_feedback))
        .route("/feedback/metrics", get(get_metrics))
        .route("/feedback/{message_id}", patch(update_feedback))
}

type ErrorBody = (StatusCode, Json<serde_json::Value>);

#[derive(Deserialize)]
pub struct SubmitFeedbackRequest {
    pub message_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub query: String,
    pub answer: String,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
}

#[derive(Deserialize)]
pub struct MetricsParams {
    #[serde(default)]
    pub days: Option<i64>,
}

/// POST /api/feedback — record an evaluation of a generated answer.
async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), ErrorBody> {
    let mut feedback =
        Feedback::new(request.query, request.answer).map_err(|e| error_response(&e))?;
    feedback.message_id = Some(request.message_id.clone());
    feedback.session_id = request.session_id;
    feedback.is_correct = request.is_correct;
    feedback.sources = request.sources;
    if let Some(rating) = request.rating {
        feedback.set_rating(rating).map_err(|e| error_response(&e))?;
    }
    if let Some(comment) = &request.comment {
        feedback.add_comment(comment);
    }

    state
        .feedback
        .save_feedback(feedback)
        .await
        .map_err(|e| error_response(&e))?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            success: true,
            message: "Feedback saved successfully".into(),
            message_id: request.message_id,
        }),
    ))
}

/// GET /api/feedback/metrics?days=N — exactitud over the trailing window.
async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsParams>,
) -> Result<Json<serde_json::Value>, ErrorBody> {
    let days = params.days.unwrap_or(DEFAULT_METRICS_WINDOW_DAYS);
    let metrics = state
        .feedback
        .get_exactitud_metrics(days)
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(serde_json::json!({
        "total_evaluaciones": metrics.total_evaluaciones,
        "respuestas_correctas": metrics.respuestas_correctas,
        "respuestas_incorrectas": metrics.respuestas_incorrectas,
        "sin_evaluar": metrics.sin_evaluar,
        "exactitud_porcentaje": (metrics.exactitud_porcentaje * 100.0).round() / 100.0,
        "rating_promedio": metrics.rating_promedio.map(|r| (r * 100.0).round() / 100.0),
        "exactitud_label": metrics.label(),
    })))
}

/// PATCH /api/feedback/{message_id} — partial update of stored feedback.
async fn update_feedback(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
    Json(update): Json<FeedbackUpdate>,
) -> Result<Json<FeedbackResponse>, ErrorBody> {
    let updated = state
        .feedback
        .update_feedback(&message_id, &update)
        .await
        .map_err(|e| error_response(&e))?;

    if !updated {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "detail": format!("No feedback found for message {message_id}"),
                "type": "NotFound",
            })),
        ));
    }

    Ok(Json(FeedbackResponse {
        success: true,
        message: format!("Feedback updated for message {message_id}"),
        message_id,
    }))
}

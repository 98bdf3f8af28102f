//! Feedback collection and the exactitud rollup.

use std::sync::Arc;

use tracing::info;

use tramita_core::{Error, Result};
use tramita_domain::{ExactitudMetrics, Feedback, FeedbackStore, FeedbackUpdate};

pub const DEFAULT_METRICS_WINDOW_DAYS: i64 = 30;

pub struct FeedbackService {
    store: Arc<dyn FeedbackStore>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store }
    }

    pub async fn save_feedback(&self, feedback: Feedback) -> Result<Feedback> {
        info!("Saving feedback for message: {:?}", feedback.message_id);
        self.store.save_feedback(feedback).await
    }

    /// Apply a partial update. The rating range is validated here so an
    /// out-of-range value never reaches the store.
    pub async fn update_feedback(&self, message_id: &str, update: &FeedbackUpdate) -> Result<bool> {
        if let Some(rating) = update.rating {
            if !(1..=5).contains(&rating) {
                return Err(Error::Validation(format!(
                    "rating must be an integer between 1 and 5, got {rating}"
                )));
            }
        }
        if update.is_empty() {
            return Ok(false);
        }
        info!("Updating feedback for message: {}", message_id);
        self.store.update_feedback(message_id, update).await
    }

    pub async fn get_feedback_by_message(&self, message_id: &str) -> Result<Option<Feedback>> {
        self.store.feedback_by_message(message_id).await
    }

    /// Exactitud over the trailing `days` window. An empty window yields
    /// zeroed metrics, never an error.
    pub async fn get_exactitud_metrics(&self, days: i64) -> Result<ExactitudMetrics> {
        info!("Calculating exactitud metrics for last {} days", days);
        let metrics = self.store.exactitud_metrics(days).await?;
        info!(
            "Exactitud calculated: {}% ({}/{})",
            metrics.exactitud_porcentaje,
            metrics.respuestas_correctas,
            metrics.respuestas_correctas + metrics.respuestas_incorrectas
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryFeedbackStore;

    fn service_with_store() -> (FeedbackService, Arc<MemoryFeedbackStore>) {
        let store = Arc::new(MemoryFeedbackStore::new());
        (FeedbackService::new(store.clone()), store)
    }

    fn feedback(message_id: &str) -> Feedback {
        let mut fb = Feedback::new("¿Qué es?", "Es la autorización...").unwrap();
        fb.message_id = Some(message_id.to_string());
        fb
    }

    #[tokio::test]
    async fn test_save_and_fetch() {
        let (service, _store) = service_with_store();
        service.save_feedback(feedback("m1")).await.unwrap();

        let fetched = service.get_feedback_by_message("m1").await.unwrap().unwrap();
        assert_eq!(fetched.query, "¿Qué es?");
        assert!(service.get_feedback_by_message("m2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_validates_rating_before_store() {
        let (service, store) = service_with_store();
        service.save_feedback(feedback("m1")).await.unwrap();

        let bad = FeedbackUpdate {
            rating: Some(6),
            ..Default::default()
        };
        assert!(matches!(
            service.update_feedback("m1", &bad).await.unwrap_err(),
            Error::Validation(_)
        ));
        // the stored row was never touched
        let stored = store.saved.lock().unwrap();
        assert!(stored[0].rating.is_none());
    }

    #[tokio::test]
    async fn test_update_applies_partial_fields() {
        let (service, _store) = service_with_store();
        service.save_feedback(feedback("m1")).await.unwrap();

        let update = FeedbackUpdate {
            is_correct: Some(false),
            rating: Some(2),
            comment: Some("respuesta incompleta".into()),
        };
        assert!(service.update_feedback("m1", &update).await.unwrap());
        let fetched = service.get_feedback_by_message("m1").await.unwrap().unwrap();
        assert_eq!(fetched.is_correct, Some(false));
        assert_eq!(fetched.rating, Some(2));
        assert_eq!(fetched.comment.as_deref(), Some("respuesta incompleta"));

        assert!(!service.update_feedback("missing", &update).await.unwrap());
        assert!(!service
            .update_feedback("m1", &FeedbackUpdate::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_metrics_empty_and_populated() {
        let (service, _store) = service_with_store();
        let metrics = service
            .get_exactitud_metrics(DEFAULT_METRICS_WINDOW_DAYS)
            .await
            .unwrap();
        assert_eq!(metrics.total_evaluaciones, 0);
        assert_eq!(metrics.rating_promedio, None);

        let mut correct = feedback("m1");
        correct.mark_correct();
        let mut wrong = feedback("m2");
        wrong.mark_incorrect();
        service.save_feedback(correct).await.unwrap();
        service.save_feedback(wrong).await.unwrap();
        service.save_feedback(feedback("m3")).await.unwrap();

        let metrics = service.get_exactitud_metrics(30).await.unwrap();
        assert_eq!(metrics.total_evaluaciones, 2);
        assert_eq!(metrics.respuestas_correctas, 1);
        assert_eq!(metrics.sin_evaluar, 1);
        assert!((metrics.exactitud_porcentaje - 50.0).abs() < 1e-9);
    }
}

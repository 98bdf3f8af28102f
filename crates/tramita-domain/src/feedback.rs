//! User feedback on generated answers and the accuracy rollup built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tramita_core::{Error, Result};

/// Feedback a user left on one generated answer. `is_correct` is tri-state:
/// correct, incorrect, or not yet evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub query: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub is_correct: Option<bool>,
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Feedback {
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Result<Self> {
        let query = query.into();
        let answer = answer.into();
        if query.trim().is_empty() {
            return Err(Error::Validation("feedback query must not be empty".into()));
        }
        if answer.trim().is_empty() {
            return Err(Error::Validation("feedback answer must not be empty".into()));
        }
        let now = Utc::now();
        Ok(Self {
            query,
            answer,
            session_id: None,
            message_id: None,
            is_correct: None,
            rating: None,
            comment: None,
            sources: None,
            chunks_count: None,
            similarity_threshold: None,
            created_at: now,
            updated_at: now,
            metadata: None,
        })
    }

    pub fn mark_correct(&mut self) {
        self.is_correct = Some(true);
        self.updated_at = Utc::now();
    }

    pub fn mark_incorrect(&mut self) {
        self.is_correct = Some(false);
        self.updated_at = Utc::now();
    }

    /// Set a 1-5 star rating. On an out-of-range value neither `rating` nor
    /// `updated_at` change.
    pub fn set_rating(&mut self, rating: i32) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(Error::Validation(format!(
                "rating must be an integer between 1 and 5, got {rating}"
            )));
        }
        self.rating = Some(rating);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn add_comment(&mut self, comment: &str) {
        let comment = comment.trim();
        if !comment.is_empty() {
            self.comment = Some(comment.to_string());
            self.updated_at = Utc::now();
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.is_correct.is_some()
    }

    pub fn is_positive(&self) -> bool {
        self.is_correct == Some(true)
    }

    pub fn is_negative(&self) -> bool {
        self.is_correct == Some(false)
    }

    pub fn has_rating(&self) -> bool {
        self.rating.is_some()
    }

    pub fn has_comment(&self) -> bool {
        self.comment.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// Partial update applied to stored feedback; absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackUpdate {
    pub is_correct: Option<bool>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl FeedbackUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_correct.is_none() && self.rating.is_none() && self.comment.is_none()
    }
}

/// Accuracy rollup over stored feedback:
/// exactitud = correctas / (correctas + incorrectas) × 100.
/// Computed on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactitudMetrics {
    pub total_evaluaciones: i64,
    pub respuestas_correctas: i64,
    pub respuestas_incorrectas: i64,
    pub sin_evaluar: i64,
    pub exactitud_porcentaje: f64,
    pub rating_promedio: Option<f64>,
}

impl ExactitudMetrics {
    pub fn new(
        total_evaluaciones: i64,
        respuestas_correctas: i64,
        respuestas_incorrectas: i64,
        sin_evaluar: i64,
        exactitud_porcentaje: f64,
        rating_promedio: Option<f64>,
    ) -> Result<Self> {
        if total_evaluaciones < 0 || respuestas_correctas < 0 || respuestas_incorrectas < 0 || sin_evaluar < 0 {
            return Err(Error::Validation("metric counts must not be negative".into()));
        }
        if !(0.0..=100.0).contains(&exactitud_porcentaje) {
            return Err(Error::Validation(format!(
                "exactitud_porcentaje must be within [0, 100], got {exactitud_porcentaje}"
            )));
        }
        Ok(Self {
            total_evaluaciones,
            respuestas_correctas,
            respuestas_incorrectas,
            sin_evaluar,
            exactitud_porcentaje,
            rating_promedio,
        })
    }

    /// Metrics for a window with no feedback at all.
    pub fn zeroed() -> Self {
        Self {
            total_evaluaciones: 0,
            respuestas_correctas: 0,
            respuestas_incorrectas: 0,
            sin_evaluar: 0,
            exactitud_porcentaje: 0.0,
            rating_promedio: None,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.exactitud_porcentaje >= 90.0 {
            "Excelente"
        } else if self.exactitud_porcentaje >= 75.0 {
            "Buena"
        } else if self.exactitud_porcentaje >= 60.0 {
            "Regular"
        } else {
            "Necesita mejora"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_requires_query_and_answer() {
        assert!(Feedback::new("¿Qué es una licencia?", "Es...").is_ok());
        assert!(Feedback::new("", "Es...").is_err());
        assert!(Feedback::new("¿Qué es?", "  ").is_err());
    }

    #[test]
    fn test_set_rating_bounds() {
        let mut fb = Feedback::new("q", "a").unwrap();
        for r in 1..=5 {
            assert!(fb.set_rating(r).is_ok());
            assert_eq!(fb.rating, Some(r));
        }

        let updated_before = fb.updated_at;
        let rating_before = fb.rating;
        for r in [0, 6, -1, 100] {
            assert!(fb.set_rating(r).is_err());
        }
        // a rejected rating leaves rating and updated_at untouched
        assert_eq!(fb.rating, rating_before);
        assert_eq!(fb.updated_at, updated_before);
    }

    #[test]
    fn test_evaluation_state() {
        let mut fb = Feedback::new("q", "a").unwrap();
        assert!(!fb.is_evaluated());
        fb.mark_correct();
        assert!(fb.is_evaluated());
        assert!(fb.is_positive());
        fb.mark_incorrect();
        assert!(fb.is_negative());
    }

    #[test]
    fn test_comment_trimming() {
        let mut fb = Feedback::new("q", "a").unwrap();
        fb.add_comment("   ");
        assert!(!fb.has_comment());
        fb.add_comment("  muy útil  ");
        assert_eq!(fb.comment.as_deref(), Some("muy útil"));
        assert!(fb.has_comment());
    }

    #[test]
    fn test_metrics_validation() {
        assert!(ExactitudMetrics::new(10, 8, 2, 0, 80.0, Some(4.2)).is_ok());
        assert!(ExactitudMetrics::new(-1, 0, 0, 0, 0.0, None).is_err());
        assert!(ExactitudMetrics::new(1, 1, 0, 0, 100.1, None).is_err());
        assert!(ExactitudMetrics::new(1, 0, 1, 0, -0.1, None).is_err());
    }

    #[test]
    fn test_label_boundaries() {
        let metrics = |pct| ExactitudMetrics::new(100, 0, 0, 0, pct, None).unwrap();
        assert_eq!(metrics(90.0).label(), "Excelente");
        assert_eq!(metrics(89.9).label(), "Buena");
        assert_eq!(metrics(75.0).label(), "Buena");
        assert_eq!(metrics(74.9).label(), "Regular");
        assert_eq!(metrics(60.0).label(), "Regular");
        assert_eq!(metrics(59.9).label(), "Necesita mejora");
        assert_eq!(metrics(0.0).label(), "Necesita mejora");
        assert_eq!(metrics(100.0).label(), "Excelente");
    }

    #[test]
    fn test_zeroed_metrics() {
        let m = ExactitudMetrics::zeroed();
        assert_eq!(m.total_evaluaciones, 0);
        assert_eq!(m.respuestas_correctas, 0);
        assert_eq!(m.respuestas_incorrectas, 0);
        assert_eq!(m.sin_evaluar, 0);
        assert_eq!(m.exactitud_porcentaje, 0.0);
        assert_eq!(m.rating_promedio, None);
    }
}

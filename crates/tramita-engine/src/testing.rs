//! In-memory store fakes shared by the engine test modules.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use tramita_core::{Error, Result};
use tramita_domain::{
    ChatMessage, ChatSession, ExactitudMetrics, Feedback, FeedbackStore, FeedbackUpdate,
    SessionStore,
};

/// In-memory `SessionStore` with switchable failure modes.
#[derive(Default)]
pub struct MemorySessionStore {
    pub sessions: Mutex<HashMap<String, ChatSession>>,
    /// Fail every call, as if the backing store were down.
    pub fail_all: bool,
    /// Fail only message reads.
    pub fail_get_messages: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_up(&self) -> Result<()> {
        if self.fail_all {
            return Err(Error::SessionStore("store unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        metadata: Option<serde_json::Value>,
    ) -> Result<ChatSession> {
        self.check_up()?;
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(session_id) {
            return Err(Error::DuplicateSession(session_id.to_string()));
        }
        let mut session = ChatSession::new(session_id)?;
        session.user_id = user_id.map(str::to_string);
        session.metadata = metadata;
        sessions.insert(session_id.to_string(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        self.check_up()?;
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn session_exists(&self, session_id: &str) -> Result<bool> {
        self.check_up()?;
        Ok(self.sessions.lock().unwrap().contains_key(session_id))
    }

    async fn add_message(&self, session_id: &str, message: &ChatMessage) -> Result<()> {
        self.check_up()?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))?;
        session.add_message(message.clone());
        Ok(())
    }

    async fn get_messages(&self, session_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        self.check_up()?;
        if self.fail_get_messages {
            return Err(Error::SessionStore("message read failed".into()));
        }
        let sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get(session_id)
            .ok_or_else(|| Error::NotFound(format!("session {session_id}")))?;
        Ok(session.recent_messages(limit as i64).to_vec())
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        self.check_up()?;
        Ok(self.sessions.lock().unwrap().remove(session_id).is_some())
    }

    async fn clear_history(&self, session_id: &str) -> Result<bool> {
        self.check_up()?;
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.clear_history();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_sessions(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<ChatSession>> {
        self.check_up()?;
        let sessions = self.sessions.lock().unwrap();
        let mut listed: Vec<ChatSession> = sessions
            .values()
            .filter(|s| user_id.is_none() || s.user_id.as_deref() == user_id)
            .map(|s| ChatSession {
                messages: Vec::new(),
                ..s.clone()
            })
            .collect();
        listed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        listed.truncate(limit);
        Ok(listed)
    }
}

/// In-memory `FeedbackStore` keyed by `message_id`.
#[derive(Default)]
pub struct MemoryFeedbackStore {
    pub saved: Mutex<Vec<Feedback>>,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for MemoryFeedbackStore {
    async fn save_feedback(&self, feedback: Feedback) -> Result<Feedback> {
        self.saved.lock().unwrap().push(feedback.clone());
        Ok(feedback)
    }

    async fn update_feedback(&self, message_id: &str, update: &FeedbackUpdate) -> Result<bool> {
        let mut saved = self.saved.lock().unwrap();
        let entry = saved
            .iter_mut()
            .find(|f| f.message_id.as_deref() == Some(message_id));
        match entry {
            Some(feedback) => {
                if let Some(is_correct) = update.is_correct {
                    feedback.is_correct = Some(is_correct);
                }
                if let Some(rating) = update.rating {
                    feedback.set_rating(rating)?;
                }
                if let Some(comment) = &update.comment {
                    feedback.add_comment(comment);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn feedback_by_message(&self, message_id: &str) -> Result<Option<Feedback>> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.message_id.as_deref() == Some(message_id))
            .cloned())
    }

    async fn exactitud_metrics(&self, _days: i64) -> Result<ExactitudMetrics> {
        let saved = self.saved.lock().unwrap();
        let correct = saved.iter().filter(|f| f.is_positive()).count() as i64;
        let incorrect = saved.iter().filter(|f| f.is_negative()).count() as i64;
        let unevaluated = saved.iter().filter(|f| !f.is_evaluated()).count() as i64;
        let evaluated = correct + incorrect;
        if saved.is_empty() {
            return Ok(ExactitudMetrics::zeroed());
        }
        let percentage = if evaluated > 0 {
            correct as f64 / evaluated as f64 * 100.0
        } else {
            0.0
        };
        ExactitudMetrics::new(evaluated, correct, incorrect, unevaluated, percentage, None)
    }
}

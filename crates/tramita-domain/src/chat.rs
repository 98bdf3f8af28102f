//! Conversation entities: messages and sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tramita_core::{Error, Result};

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Label used when rendering a conversation transcript for the LLM.
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Self::User => "Usuario",
            Self::Assistant => "Asistente",
            Self::System => "Sistema",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(Error::Validation(format!(
                "invalid role '{other}': must be 'user', 'assistant' or 'system'"
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation. Immutable value object; content is
/// validated at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(Error::Validation("message content must not be empty".into()));
        }
        Ok(Self {
            role,
            content,
            created_at: Utc::now(),
            metadata: None,
        })
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_user_message(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant_message(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Render messages as the labeled transcript fed to the chat provider,
/// entries separated by blank lines.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.transcript_label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A durable conversation thread holding ordered messages across turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ChatSession {
    pub fn new(session_id: impl Into<String>) -> Result<Self> {
        let session_id = session_id.into();
        if session_id.trim().is_empty() {
            return Err(Error::Validation("session_id must not be empty".into()));
        }
        let now = Utc::now();
        Ok(Self {
            session_id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            user_id: None,
            metadata: None,
        })
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.touch();
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn user_messages(&self) -> Vec<&ChatMessage> {
        self.messages.iter().filter(|m| m.is_user_message()).collect()
    }

    pub fn assistant_messages(&self) -> Vec<&ChatMessage> {
        self.messages.iter().filter(|m| m.is_assistant_message()).collect()
    }

    /// The trailing `limit` messages in chronological order. A zero or
    /// negative limit returns the full list.
    pub fn recent_messages(&self, limit: i64) -> &[ChatMessage] {
        if limit <= 0 {
            return &self.messages;
        }
        let start = self.messages.len().saturating_sub(limit as usize);
        &self.messages[start..]
    }

    /// Labeled transcript of the most recent `max_messages` messages.
    pub fn conversation_context(&self, max_messages: i64) -> String {
        render_transcript(self.recent_messages(max_messages))
    }

    pub fn clear_history(&mut self) {
        self.messages.clear();
        self.touch();
    }

    // updated_at must strictly advance on every mutation, even on a clock
    // too coarse to distinguish consecutive calls.
    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_message_requires_content() {
        assert!(ChatMessage::new(Role::User, "hola").is_ok());
        assert!(ChatMessage::new(Role::User, "").is_err());
        assert!(ChatMessage::new(Role::Assistant, "   \n\t ").is_err());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("assistant").unwrap(), Role::Assistant);
        assert_eq!(Role::from_str("system").unwrap(), Role::System);
        assert!(Role::from_str("moderator").is_err());
        assert!(Role::from_str("USER").is_err());
    }

    #[test]
    fn test_session_requires_id() {
        assert!(ChatSession::new("s1").is_ok());
        assert!(ChatSession::new("").is_err());
        assert!(ChatSession::new("   ").is_err());
    }

    #[test]
    fn test_add_message_advances_updated_at() {
        let mut session = ChatSession::new("s1").unwrap();
        let before = session.updated_at;
        session.add_message(ChatMessage::new(Role::User, "hola").unwrap());
        assert!(session.updated_at > before);
        assert_eq!(session.message_count(), 1);

        let before = session.updated_at;
        session.clear_history();
        assert!(session.updated_at > before);
        assert!(!session.has_messages());
    }

    #[test]
    fn test_recent_messages_limits() {
        let mut session = ChatSession::new("s1").unwrap();
        for i in 0..5 {
            session.add_message(ChatMessage::new(Role::User, format!("m{i}")).unwrap());
        }
        assert_eq!(session.recent_messages(2).len(), 2);
        assert_eq!(session.recent_messages(2)[0].content, "m3");
        assert_eq!(session.recent_messages(2)[1].content, "m4");
        // zero and negative limits mean "everything"
        assert_eq!(session.recent_messages(0).len(), 5);
        assert_eq!(session.recent_messages(-1).len(), 5);
        // limit larger than the list
        assert_eq!(session.recent_messages(50).len(), 5);
    }

    #[test]
    fn test_transcript_labels() {
        let messages = vec![
            ChatMessage::new(Role::User, "¿Qué requisitos hay?").unwrap(),
            ChatMessage::new(Role::Assistant, "Los siguientes...").unwrap(),
            ChatMessage::new(Role::System, "contexto").unwrap(),
        ];
        let transcript = render_transcript(&messages);
        assert_eq!(
            transcript,
            "Usuario: ¿Qué requisitos hay?\n\nAsistente: Los siguientes...\n\nSistema: contexto"
        );
    }

    #[test]
    fn test_conversation_context_empty_session() {
        let session = ChatSession::new("s1").unwrap();
        assert_eq!(session.conversation_context(10), "");
    }

    #[test]
    fn test_message_filters() {
        let mut session = ChatSession::new("s1").unwrap();
        session.add_message(ChatMessage::new(Role::User, "a").unwrap());
        session.add_message(ChatMessage::new(Role::Assistant, "b").unwrap());
        session.add_message(ChatMessage::new(Role::User, "c").unwrap());
        assert_eq!(session.user_messages().len(), 2);
        assert_eq!(session.assistant_messages().len(), 1);
    }
}

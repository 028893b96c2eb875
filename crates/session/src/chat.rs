use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use jobs::JobError;

pub const GREETING: &str = "Hello! I'm your AI assistant. I can help you edit your video, suggest improvements, or answer any questions about Editverse AI features.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only conversation shown in the assistant sidebar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl Default for ChatLog {
    fn default() -> Self {
        let mut log = Self {
            messages: Vec::new(),
        };
        log.push(Role::Assistant, GREETING);
        log
    }
}

impl ChatLog {
    pub fn push(&mut self, role: Role, content: impl Into<String>) -> &ChatMessage {
        let id = self.messages.last().map_or(1, |m| m.id + 1);
        self.messages.push(ChatMessage {
            id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn user(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(Role::User, content)
    }

    pub fn assistant(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(Role::Assistant, content)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

/// Produces the assistant's answer to the latest user message.
#[async_trait::async_trait]
pub trait ChatResponder: Send + Sync {
    async fn respond(&self, history: &[ChatMessage]) -> Result<String, JobError>;
}

/// Offline responder that acknowledges the request after a short pause.
#[derive(Debug, Clone)]
pub struct LocalResponder {
    delay: Duration,
}

impl Default for LocalResponder {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

impl LocalResponder {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn acknowledge(request: &str) -> String {
        format!(
            "I understand you want to {}. Let me help you with that! You can use the tools in the toolbar to make those edits.",
            request.to_lowercase()
        )
    }
}

#[async_trait::async_trait]
impl ChatResponder for LocalResponder {
    async fn respond(&self, history: &[ChatMessage]) -> Result<String, JobError> {
        let request = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .ok_or(JobError::InvalidResponse("user message"))?;
        tokio::time::sleep(self.delay).await;
        Ok(Self::acknowledge(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_starts_with_greeting() {
        let log = ChatLog::default();
        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].role, Role::Assistant);
        assert_eq!(log.messages()[0].content, GREETING);
        assert_eq!(log.messages()[0].id, 1);
    }

    #[test]
    fn ids_increase() {
        let mut log = ChatLog::default();
        log.user("cut the intro");
        log.assistant("done");
        let ids: Vec<u64> = log.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(log.count(Role::User), 1);
        assert!(log.messages()[1].timestamp <= log.messages()[2].timestamp);
    }

    #[tokio::test(start_paused = true)]
    async fn local_responder_echoes_lowercased_request() {
        let mut log = ChatLog::default();
        log.user("Make It Brighter");
        let start = tokio::time::Instant::now();
        let reply = LocalResponder::default().respond(log.messages()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(
            reply,
            "I understand you want to make it brighter. Let me help you with that! You can use the tools in the toolbar to make those edits."
        );
    }

    #[tokio::test]
    async fn local_responder_needs_a_user_message() {
        let log = ChatLog::default();
        let err = LocalResponder::with_delay(Duration::ZERO)
            .respond(log.messages())
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidResponse(_)));
    }
}

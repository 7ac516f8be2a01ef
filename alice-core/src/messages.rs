//! Conversation message types.
//!
//! A [`Message`] is either a user prompt or a bot reply. User messages are
//! complete the moment they are created. Bot messages start out
//! [`MessageStatus::Active`] and grow as stream deltas arrive until the turn
//! that owns them finishes.

use crate::identifier::{now_utc, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The agent side of the conversation.
    Bot,
}

/// Lifecycle state of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MessageStatus {
    /// Still receiving deltas.
    Active,
    /// The stream ended cleanly.
    Completed,
    /// The stream ended early; whatever arrived before the failure is kept.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl MessageStatus {
    /// Create a failed status.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Whether the message can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Whether the message ended in failure.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
    thinking: String,
    execution_results: Vec<String>,
    notices: Vec<String>,
    status: MessageStatus,
    created_at: DateTime<Utc>,
}

impl Message {
    /// Create a finished user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            thinking: String::new(),
            execution_results: Vec::new(),
            notices: Vec::new(),
            status: MessageStatus::Completed,
            created_at: now_utc(),
        }
    }

    /// Create an empty, active bot placeholder.
    #[must_use]
    pub fn bot_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Bot,
            content: String::new(),
            thinking: String::new(),
            execution_results: Vec::new(),
            notices: Vec::new(),
            status: MessageStatus::Active,
            created_at: now_utc(),
        }
    }

    /// Message identifier.
    #[must_use]
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Message author.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Visible answer text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Reasoning text (bot only).
    #[must_use]
    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    /// Execution feedback entries in arrival order (bot only).
    #[must_use]
    pub fn execution_results(&self) -> &[String] {
        &self.execution_results
    }

    /// Backend progress notices in arrival order (bot only).
    #[must_use]
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Lifecycle state.
    #[must_use]
    pub fn status(&self) -> &MessageStatus {
        &self.status
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this is a bot message still receiving deltas.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.role == Role::Bot && self.status == MessageStatus::Active
    }

    /// Whether the message has any bot-side output at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            && self.thinking.is_empty()
            && self.execution_results.is_empty()
            && self.notices.is_empty()
    }

    /// Append reasoning text.
    pub fn push_thinking(&mut self, text: &str) {
        self.thinking.push_str(text);
    }

    /// Append answer text.
    pub fn push_content(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Append one execution result entry.
    pub fn push_execution_result(&mut self, text: impl Into<String>) {
        self.execution_results.push(text.into());
    }

    /// Append one progress notice.
    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.notices.push(text.into());
    }

    pub(crate) fn set_status(&mut self, status: MessageStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_terminal() {
        let msg = Message::user("hi");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.content(), "hi");
        assert!(msg.status().is_terminal());
        assert!(!msg.is_active());
    }

    #[test]
    fn test_bot_placeholder_is_active_and_empty() {
        let msg = Message::bot_placeholder();
        assert_eq!(msg.role(), Role::Bot);
        assert!(msg.is_active());
        assert!(msg.is_empty());
    }

    #[test]
    fn test_accumulation() {
        let mut msg = Message::bot_placeholder();
        msg.push_thinking("let me ");
        msg.push_thinking("see");
        msg.push_content("Hello");
        msg.push_execution_result("42");
        msg.push_notice("running code");

        assert_eq!(msg.thinking(), "let me see");
        assert_eq!(msg.content(), "Hello");
        assert_eq!(msg.execution_results(), ["42".to_string()]);
        assert_eq!(msg.notices().len(), 1);
        assert!(!msg.is_empty());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(MessageStatus::failed("boom")).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "boom");
    }
}

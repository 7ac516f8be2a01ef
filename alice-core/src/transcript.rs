//! The conversation transcript.
//!
//! A [`Transcript`] is a cheap-to-clone value: messages are held behind
//! [`Arc`], so cloning copies pointers only. Mutating the active message goes
//! through [`Arc::make_mut`], which copies that one message when an earlier
//! snapshot still shares it. Snapshots handed to observers therefore never
//! change underneath them.
//!
//! At most one message is active, and if present it is the last one.

use crate::errors::{Result, TranscriptError};
use crate::messages::{Message, MessageStatus};
use crate::identifier::MessageId;
use serde::ser::{Serialize, Serializer};
use std::sync::Arc;

/// Ordered, append-only sequence of messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Arc<Message>>,
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate over messages in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().map(AsRef::as_ref)
    }

    /// Shared handles to every message.
    #[must_use]
    pub fn messages(&self) -> &[Arc<Message>] {
        &self.messages
    }

    /// Message at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index).map(AsRef::as_ref)
    }

    /// The most recent message.
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last().map(AsRef::as_ref)
    }

    /// The active bot message, if a turn is in progress.
    #[must_use]
    pub fn active(&self) -> Option<&Message> {
        self.last().filter(|m| m.is_active())
    }

    /// Whether a turn is in progress.
    #[must_use]
    pub fn has_active(&self) -> bool {
        self.active().is_some()
    }

    /// Append a user message followed by an active bot placeholder.
    ///
    /// Returns the placeholder's ID.
    pub fn begin_turn(&mut self, user_text: impl Into<String>) -> Result<MessageId> {
        if self.has_active() {
            return Err(TranscriptError::ActiveTurnInProgress);
        }

        let placeholder = Message::bot_placeholder();
        let id = placeholder.id().clone();
        self.messages.push(Arc::new(Message::user(user_text)));
        self.messages.push(Arc::new(placeholder));
        Ok(id)
    }

    /// Mutable access to the active bot message.
    ///
    /// Copies the message first if another snapshot shares it.
    pub fn active_mut(&mut self) -> Option<&mut Message> {
        let last = self.messages.last_mut()?;
        if !last.is_active() {
            return None;
        }
        Some(Arc::make_mut(last))
    }

    /// Move the active bot message into a terminal state.
    pub fn finish_active(&mut self, status: MessageStatus) -> Result<()> {
        debug_assert!(status.is_terminal());
        let active = self
            .active_mut()
            .ok_or(TranscriptError::NoActiveMessage)?;
        active.set_status(status);
        Ok(())
    }
}

impl Serialize for Transcript {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

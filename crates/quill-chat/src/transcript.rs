//! Conversation transcript: ordered messages with monotonic ids

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation message.
///
/// Assistant content is replaced in place while its stream is in flight;
/// user content never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: String,
}

/// Ordered conversation history for one chat.
///
/// Append-only except for in-place replacement of the trailing assistant
/// message's content, truncation from the last user message on retry, and
/// wholesale replacement when switching chats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a transcript from stored messages, resuming id assignment
    /// past the largest loaded id.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        let next_id = messages.iter().map(|m| m.id + 1).max().unwrap_or(0);
        Self { messages, next_id }
    }

    /// Append a message, returning its assigned id.
    pub fn push(&mut self, role: Role, content: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            content: content.into(),
        });
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Current content of the message with `id`.
    pub fn content_of(&self, id: u64) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.content.as_str())
    }

    /// Replace the content of the message with `id` wholesale.
    ///
    /// Full-replace rather than append: applying the same accumulated text
    /// twice leaves the message unchanged. Returns false if `id` is unknown.
    pub fn set_content(&mut self, id: u64, content: impl Into<String>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Index of the most recent user message, scanning from the end.
    pub fn last_user_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == Role::User)
    }

    /// First user message, if any (title derivation).
    pub fn first_user(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == Role::User)
    }

    /// Remove every message from `index` onward.
    pub fn truncate_from(&mut self, index: usize) {
        self.messages.truncate(index);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

//! Wire types for the completion endpoint

use serde::{Deserialize, Serialize};

/// Message roles on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role/content turn in a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for the completion endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<Turn>,
    pub stream: bool,
    pub max_tokens: u32,
}

/// A single streamed chunk payload
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
}

/// Incremental payload inside a chunk. Either field may carry the fragment;
/// `content` takes priority over `reasoning_content`.
#[derive(Debug, Default, Deserialize)]
pub struct StreamDelta {
    pub content: Option<String>,
    pub reasoning_content: Option<String>,
}

impl StreamChunk {
    /// Extract the non-empty delta fragment from the first choice, if any.
    pub fn fragment(&self) -> Option<&str> {
        let delta = &self.choices.first()?.delta;
        delta
            .content
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| delta.reasoning_content.as_deref().filter(|s| !s.is_empty()))
    }
}

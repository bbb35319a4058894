//! Session event types

use serde::{Deserialize, Serialize};

use crate::history::ChatSummary;

/// How a stream attempt finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamOutcome {
    /// Transport reached end of stream.
    Completed,
    /// Stopped by the user; partial content kept with a stop marker.
    Cancelled,
    /// Transport or endpoint failure; content replaced with an error notice.
    Failed,
}

/// Events emitted by a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Streaming started; `message_id` is the pending assistant message.
    StreamStart { message_id: u64 },

    /// The pending assistant message's content was replaced.
    MessageUpdate { message_id: u64, content: String },

    /// The stream attempt finished.
    StreamEnd {
        message_id: u64,
        outcome: StreamOutcome,
    },

    /// The transcript changed in a way worth persisting. Snapshot for the
    /// persistence collaborator, which decides batching.
    TranscriptChanged { summary: ChatSummary },
}

impl SessionEvent {
    /// Check if this event ends a stream attempt
    pub fn is_stream_end(&self) -> bool {
        matches!(self, SessionEvent::StreamEnd { .. })
    }
}

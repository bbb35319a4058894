//! Persistence contract: chat summaries and the history store trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::Result, transcript::Message};

/// Snapshot handed to the persistence collaborator after a transcript change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    /// Derived from the first user message.
    pub title: String,
    pub messages: Vec<Message>,
    /// Millisecond timestamps.
    pub created_at: i64,
    pub updated_at: i64,
}

/// Durable chat-history storage.
///
/// The session core never writes through this directly for saves; it emits
/// [`crate::SessionEvent::TranscriptChanged`] snapshots and lets the
/// collaborator decide batching. Loading and deletion go through the trait.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, summary: ChatSummary) -> Result<()>;

    /// All stored chats, newest first.
    async fn load_all(&self) -> Result<Vec<ChatSummary>>;

    async fn delete(&self, chat_id: &str) -> Result<()>;
}

/// Conversational lead-ins stripped when deriving a chat title.
const TITLE_PREFIXES: &[&str] = &[
    "what is",
    "what are",
    "who is",
    "who are",
    "how to",
    "how do i",
    "how do you",
    "can you",
    "could you",
    "please",
    "tell me about",
    "explain",
    "describe",
    "define",
    "write a",
    "create a",
    "make a",
];

const TITLE_MAX_CHARS: usize = 40;
const DEFAULT_TITLE: &str = "New Chat";

/// Derive a sidebar title from the first user message.
///
/// Strips one leading conversational prefix and trailing punctuation,
/// capitalizes the first letter, and caps the length.
pub fn derive_title(content: &str) -> String {
    let mut title = content.trim();

    for prefix in TITLE_PREFIXES {
        if let Some(rest) = strip_prefix_ignore_case(title, prefix) {
            title = rest.trim_start();
            break;
        }
    }

    let title = title.trim_end_matches(['?', '.', ',', '!']);

    let mut chars = title.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => return DEFAULT_TITLE.to_string(),
    };

    let capped: String = capitalized.chars().take(TITLE_MAX_CHARS).collect();
    if capped.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        capped
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_strips_prefix_and_punctuation() {
        assert_eq!(derive_title("What is CTP?"), "CTP");
    }

    #[test]
    fn test_title_strips_only_one_prefix() {
        assert_eq!(derive_title("explain what is love"), "What is love");
    }

    #[test]
    fn test_title_capitalizes() {
        assert_eq!(derive_title("how do i register for training"), "Register for training");
    }

    #[test]
    fn test_title_caps_length() {
        let long = "a".repeat(80);
        assert_eq!(derive_title(&long).chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_title_empty_falls_back() {
        assert_eq!(derive_title(""), "New Chat");
        assert_eq!(derive_title("   "), "New Chat");
        assert_eq!(derive_title("please?"), "New Chat");
    }

    #[test]
    fn test_title_plain_text_unchanged() {
        assert_eq!(derive_title("Brake systems overview"), "Brake systems overview");
    }
}

//! File-backed chat history: one JSON document per chat

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

use quill_chat::{ChatSummary, Error, HistoryStore, Result};

/// Stores each chat as `<id>.json` under a data directory.
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default storage location
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
            .join("chats")
    }

    fn chat_path(&self, chat_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", chat_id))
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn save(&self, summary: ChatSummary) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::History(e.to_string()))?;
        let path = self.chat_path(&summary.id);
        let content =
            serde_json::to_string(&summary).map_err(|e| Error::History(e.to_string()))?;
        fs::write(path, content).map_err(|e| Error::History(e.to_string()))
    }

    async fn load_all(&self) -> Result<Vec<ChatSummary>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut chats = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::History(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::History(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(|e| Error::History(e.to_string()))
                .and_then(|content| {
                    serde_json::from_str::<ChatSummary>(&content)
                        .map_err(|e| Error::History(e.to_string()))
                }) {
                Ok(summary) => chats.push(summary),
                Err(e) => {
                    // One corrupt file must not hide the rest of the history.
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable chat");
                }
            }
        }

        // Newest first
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }

    async fn delete(&self, chat_id: &str) -> Result<()> {
        fs::remove_file(self.chat_path(chat_id)).map_err(|e| Error::History(e.to_string()))
    }
}

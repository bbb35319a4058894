//! Chat session: transcript ownership, stream consumption, cancellation

use std::sync::{Arc, atomic::Ordering};

use futures::StreamExt;
use tokio::sync::broadcast;

use quill_ai::{CompletionEvent, Turn};

use crate::{
    error::Result,
    events::{SessionEvent, StreamOutcome},
    handle::SessionHandle,
    history::{ChatSummary, HistoryStore, derive_title},
    transcript::{Role, Transcript},
    transport::CompletionTransport,
};

/// Appended to the partial content when the user stops a stream.
pub const STOP_MARKER: &str = "\n\n*[Response stopped by user]*";

/// Replaces the pending content when a stream attempt fails.
pub const ERROR_NOTICE: &str = "⚠️ Error: Unable to get response. Please try again.";

/// Where the session sits in its streaming lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
    Cancelling,
}

/// A chat session: one transcript, at most one in-flight stream.
///
/// The transcript is mutated only from the control flow driving the stream.
/// External tasks interact through a [`SessionHandle`] (cancellation) and the
/// event channel.
pub struct ChatSession {
    transport: Arc<dyn CompletionTransport>,
    history: Arc<dyn HistoryStore>,
    transcript: Transcript,
    chat_id: Option<String>,
    created_at: Option<i64>,
    state: StreamState,
    handle: SessionHandle,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn CompletionTransport>, history: Arc<dyn HistoryStore>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            transport,
            history,
            transcript: Transcript::new(),
            chat_id: None,
            created_at: None,
            state: StreamState::Idle,
            handle: SessionHandle::new(),
            event_tx,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for stopping the stream from external code.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn messages(&self) -> &[crate::transcript::Message] {
        self.transcript.messages()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// Derived view: streaming and the trailing assistant message is still
    /// empty. Never stored.
    pub fn is_thinking(&self) -> bool {
        self.state == StreamState::Streaming
            && self
                .transcript
                .last()
                .is_some_and(|m| m.role == Role::Assistant && m.content.is_empty())
    }

    /// Snapshot of the current chat for persistence, when one exists.
    pub fn summary(&self) -> Option<ChatSummary> {
        let id = self.chat_id.clone()?;
        if self.transcript.is_empty() {
            return None;
        }
        let first_user = self
            .transcript
            .first_user()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let now = chrono::Utc::now().timestamp_millis();
        Some(ChatSummary {
            id,
            title: derive_title(first_user),
            messages: self.transcript.messages().to_vec(),
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
        })
    }

    /// Submit a prompt and drive the response stream to completion.
    ///
    /// No-op when `text` trims to empty or a stream is already in flight
    /// (duplicate-submission guard). Appends the user message and an empty
    /// assistant placeholder, then consumes the stream, replacing the
    /// placeholder's content with the accumulated text after each delta.
    pub async fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.state != StreamState::Idle {
            tracing::debug!("submit ignored: stream already in flight");
            return;
        }

        if self.chat_id.is_none() {
            self.chat_id = Some(uuid::Uuid::new_v4().to_string());
            self.created_at = Some(chrono::Utc::now().timestamp_millis());
        }

        self.transcript.push(Role::User, text);
        let pending = self.transcript.push(Role::Assistant, "");
        self.state = StreamState::Streaming;
        self.handle.reset();
        self.handle.is_streaming.store(true, Ordering::Release);

        self.emit_transcript_changed();
        let _ = self.event_tx.send(SessionEvent::StreamStart {
            message_id: pending,
        });

        // Single-turn request: the server is stateless, history stays
        // client-side.
        let turns = vec![Turn::user(text)];
        let outcome = self.run_stream(pending, turns).await;

        self.state = StreamState::Idle;
        self.handle.is_streaming.store(false, Ordering::Release);
        let _ = self.event_tx.send(SessionEvent::StreamEnd {
            message_id: pending,
            outcome,
        });
        self.emit_transcript_changed();
    }

    /// Signal cancellation of the in-flight stream. Valid only while
    /// streaming; otherwise a no-op.
    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Discard the most recent user/assistant pair and re-submit the same
    /// user text. No-op while streaming or when no user message exists.
    pub async fn retry(&mut self) {
        if self.state != StreamState::Idle {
            return;
        }
        let Some(index) = self.transcript.last_user_index() else {
            return;
        };
        let text = self.transcript.messages()[index].content.clone();
        self.transcript.truncate_from(index);
        self.emit_transcript_changed();
        self.submit(&text).await;
    }

    /// Reset to an empty, unsaved chat. Any in-flight stream is cancelled
    /// silently: a hard reset, not a user-visible cancellation.
    pub fn new_chat(&mut self) {
        self.cancel_silent();
        self.transcript = Transcript::new();
        self.chat_id = None;
        self.created_at = None;
    }

    /// Replace the transcript with a stored chat. Returns `false` (leaving
    /// the transcript untouched) when `id` does not resolve in the history
    /// collaborator.
    pub async fn load_chat(&mut self, id: &str) -> Result<bool> {
        self.cancel_silent();
        let chats = self.history.load_all().await?;
        let Some(chat) = chats.into_iter().find(|c| c.id == id) else {
            tracing::debug!(%id, "load_chat: unknown chat id");
            return Ok(false);
        };
        self.transcript = Transcript::from_messages(chat.messages);
        self.chat_id = Some(chat.id);
        self.created_at = Some(chat.created_at);
        Ok(true)
    }

    /// Delete a stored chat. Deleting the current chat falls through to
    /// [`ChatSession::new_chat`].
    pub async fn delete_chat(&mut self, id: &str) -> Result<()> {
        self.history.delete(id).await?;
        if self.chat_id.as_deref() == Some(id) {
            self.new_chat();
        }
        Ok(())
    }

    /// Consume the completion stream for the pending assistant message.
    ///
    /// The cancel signal is checked at every suspension point and before
    /// every transcript mutation, so a chunk racing a stop can never land
    /// after the stop marker.
    async fn run_stream(&mut self, pending: u64, turns: Vec<Turn>) -> StreamOutcome {
        let cancel = self.handle.token();

        let mut stream = match self.transport.stream(turns).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "completion request failed");
                self.apply_content(pending, ERROR_NOTICE.to_string());
                return StreamOutcome::Failed;
            }
        };

        let mut accumulated = String::new();
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.state = StreamState::Cancelling;
                    accumulated.push_str(STOP_MARKER);
                    self.apply_content(pending, accumulated);
                    return StreamOutcome::Cancelled;
                }

                event = stream.next() => match event {
                    Some(CompletionEvent::Delta(fragment)) => {
                        if cancel.is_cancelled() {
                            // Loop back; the biased select takes the cancel arm.
                            continue;
                        }
                        accumulated.push_str(&fragment);
                        self.apply_content(pending, accumulated.clone());
                    }
                    Some(CompletionEvent::Error { message }) => {
                        tracing::warn!(%message, "stream failed mid-flight");
                        self.apply_content(pending, ERROR_NOTICE.to_string());
                        return StreamOutcome::Failed;
                    }
                    Some(CompletionEvent::Done) | None => {
                        return StreamOutcome::Completed;
                    }
                }
            }
        }
    }

    /// Replace the pending message's content and notify observers.
    fn apply_content(&mut self, id: u64, content: String) {
        self.transcript.set_content(id, content.clone());
        let _ = self.event_tx.send(SessionEvent::MessageUpdate {
            message_id: id,
            content,
        });
    }

    fn emit_transcript_changed(&self) {
        if let Some(summary) = self.summary() {
            let _ = self
                .event_tx
                .send(SessionEvent::TranscriptChanged { summary });
        }
    }

    fn cancel_silent(&mut self) {
        if self.state != StreamState::Idle {
            self.handle.cancel.lock().cancel();
            self.handle.is_streaming.store(false, Ordering::Release);
            self.state = StreamState::Idle;
        }
    }
}

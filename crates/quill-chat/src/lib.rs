//! quill-chat: streaming chat session runtime
//!
//! This crate owns the conversation transcript and the session state machine
//! that drives one streaming completion at a time, with cooperative
//! cancellation and user-initiated retry.

pub mod error;
pub mod events;
pub mod handle;
pub mod history;
pub mod session;
pub mod transcript;
pub mod transport;

pub use error::{Error, Result};
pub use events::{SessionEvent, StreamOutcome};
pub use handle::SessionHandle;
pub use history::{ChatSummary, HistoryStore, derive_title};
pub use session::{ChatSession, StreamState};
pub use transcript::{Message, Role, Transcript};
pub use transport::{CompletionTransport, EndpointTransport};

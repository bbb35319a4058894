//! Error types for quill-chat

use thiserror::Error;

/// Result type alias using quill-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the completion endpoint layer
    #[error(transparent)]
    Completion(#[from] quill_ai::Error),

    /// An error from the history collaborator (string-based for flexibility)
    #[error("history error: {0}")]
    History(String),
}

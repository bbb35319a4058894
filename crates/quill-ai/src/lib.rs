//! quill-ai: client layer for the streaming completion endpoint
//!
//! This crate owns the wire types, the incremental record assembler for the
//! newline-delimited `data:` event protocol, and the HTTP client that turns
//! a chunked response body into a stream of delta events.

pub mod client;
pub mod error;
pub mod sse;
pub mod types;

pub use client::{CompletionClient, CompletionEvent, CompletionEventStream, EndpointConfig};
pub use error::{Error, Result};
pub use sse::RecordAssembler;
pub use types::*;

//! A cloneable handle for poking the session from external code.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// A cloneable handle for stopping an in-flight stream from outside the
/// control flow that drives it (e.g. a Ctrl-C handler).
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) is_streaming: Arc<AtomicBool>,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            is_streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation of the in-flight stream. No-op when idle.
    pub fn stop(&self) {
        if self.is_streaming.load(Ordering::Acquire) {
            self.cancel.lock().cancel();
        }
    }

    /// Whether a stream is currently in flight.
    pub fn is_streaming(&self) -> bool {
        self.is_streaming.load(Ordering::Acquire)
    }

    /// Get a clone of the current cancellation token.
    pub(crate) fn token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Install a fresh token for a new stream attempt.
    pub(crate) fn reset(&self) {
        *self.cancel.lock() = CancellationToken::new();
    }
}

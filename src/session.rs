//! Upload session state.
//!
//! The only piece of state the chat keeps between events: whether any upload
//! has been accepted by the backend. Everything else lives in the view.

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether an upload has completed at least once.
///
/// The flag only ever moves from `false` to `true`; a failed upload after a
/// successful one leaves it set.
#[derive(Debug, Default)]
pub struct UploadSession {
    uploaded: AtomicBool,
}

impl UploadSession {
    /// Create a session with no completed upload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether questions may be asked.
    pub fn is_uploaded(&self) -> bool {
        self.uploaded.load(Ordering::Acquire)
    }

    /// Record a successful upload.
    pub fn mark_uploaded(&self) {
        self.uploaded.store(true, Ordering::Release);
    }
}

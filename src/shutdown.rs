//! Cooperative cancellation.
//!
//! The flag is raised from the Ctrl+C handler (or the terminal trigger
//! thread) and observed by the active source at each of its suspension
//! points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop request.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create an unraised flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder to stop.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Check whether stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Raise the flag on Ctrl+C.
    pub fn install_ctrlc_handler(&self) -> Result<(), ctrlc::Error> {
        let shutdown = self.clone();
        ctrlc::set_handler(move || shutdown.request())
    }
}

//! git::cancel
//!
//! Caller-supplied cancellation for long-running git operations.
//!
//! A `CancelToken` is cheap to clone; all clones observe the same signal.
//! Operations that spawn `git` kill and reap the child when the token
//! fires, and reference walks check it between entries.
//!
//! # Example
//!
//! ```
//! use refkeep::git::CancelToken;
//!
//! let token = CancelToken::new();
//! let observer = token.clone();
//! assert!(!observer.is_cancelled());
//!
//! token.cancel();
//! assert!(observer.is_cancelled());
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// A shared, one-shot cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a token that has not fired.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Check whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal has fired.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

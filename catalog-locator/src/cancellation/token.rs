//! Cancellation token checked between fetch steps.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::LocatorError;

#[derive(Default)]
struct TokenState {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
}

/// A cloneable token for cooperative cancellation.
///
/// Clones share state, so a caller can keep one clone and hand another to the
/// search. Cancellation is idempotent: only the first reason is kept. A
/// [`child`](Self::child) token observes its parent's cancellation but can be
/// cancelled on its own without touching the parent.
#[derive(Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
    parent: Option<Box<CancellationToken>>,
}

impl CancellationToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that is cancelled when either it or `self` is.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            state: Arc::default(),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Requests cancellation with a reason.
    pub fn cancel(&self, reason: impl Into<String>) {
        // The flag is raised under the reason lock, so a reader that sees
        // the flag always finds the reason.
        let mut slot = self.state.reason.write();
        if self.state.cancelled.load(Ordering::SeqCst) {
            return;
        }
        let reason = reason.into();
        debug!(reason = %reason, "Search cancellation requested");
        *slot = Some(reason);
        self.state.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancels the token once `after` has elapsed.
    ///
    /// Must be called from within a tokio runtime. The timer lives as long as
    /// the returned guard; dropping the guard disarms it.
    #[must_use = "dropping the timer disarms it"]
    pub fn cancel_after(&self, after: Duration) -> DeadlineTimer {
        let token = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            token.cancel(format!("deadline of {}ms elapsed", after.as_millis()));
        });
        DeadlineTimer { handle }
    }

    /// Returns whether cancellation has been requested on this token or an
    /// ancestor.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Returns the cancellation reason, if any. The token's own reason wins
    /// over an ancestor's.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.state
            .reason
            .read()
            .clone()
            .or_else(|| self.parent.as_ref().and_then(|p| p.reason()))
    }

    /// Returns `Err(LocatorError::Cancelled)` if cancellation was requested.
    ///
    /// `step` names the fetch that is about to run, for the error message.
    pub fn checkpoint(&self, step: &str) -> Result<(), LocatorError> {
        if !self.is_cancelled() {
            return Ok(());
        }
        let reason = self.reason().unwrap_or_else(|| "cancelled".to_string());
        Err(LocatorError::Cancelled(format!("{reason} (before {step})")))
    }
}

/// A pending [`CancellationToken::cancel_after`] timer.
///
/// The timer task is aborted when the guard is dropped.
#[derive(Debug)]
pub struct DeadlineTimer {
    handle: JoinHandle<()>,
}

impl DeadlineTimer {
    /// Stops the timer without cancelling the token.
    pub fn disarm(self) {}

    /// Returns whether the timer has fired or been aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
        assert!(token.checkpoint("page 1").is_ok());
    }

    #[test]
    fn test_token_cancel_first_reason_wins() {
        let token = CancellationToken::new();
        token.cancel("user closed tab");
        token.cancel("deadline");

        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("user closed tab".to_string()));
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let handle = token.clone();
        handle.cancel("stop");
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_checkpoint_reports_step() {
        let token = CancellationToken::new();
        token.cancel("stop");
        let err = token.checkpoint("probe page 8").unwrap_err();
        assert_eq!(
            err,
            LocatorError::Cancelled("stop (before probe page 8)".to_string())
        );
    }

    #[tokio::test]
    async fn test_cancel_after_deadline() {
        let token = CancellationToken::new();
        let timer = token.cancel_after(Duration::from_millis(20));
        assert!(!token.is_cancelled());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(token.is_cancelled());
        assert!(token.reason().unwrap().contains("20ms"));
        assert!(timer.is_finished());
    }

    #[tokio::test]
    async fn test_dropped_timer_never_fires() {
        let token = CancellationToken::new();
        let timer = token.cancel_after(Duration::from_millis(20));
        timer.disarm();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = CancellationToken::new();
        let child = parent.child();
        parent.cancel("shutdown");

        assert!(child.is_cancelled());
        assert_eq!(child.reason(), Some("shutdown".to_string()));
        assert!(child.checkpoint("page 2").unwrap_err().to_string().contains("shutdown"));
    }

    #[test]
    fn test_cancelling_child_leaves_parent_alone() {
        let parent = CancellationToken::new();
        let child = parent.child();
        child.cancel("deadline");
        parent.cancel("shutdown");

        assert_eq!(child.reason(), Some("deadline".to_string()));
        assert_eq!(parent.reason(), Some("shutdown".to_string()));

        let fresh = CancellationToken::new();
        fresh.child().cancel("deadline");
        assert!(!fresh.is_cancelled());
    }

    #[test]
    fn test_reason_is_visible_once_cancelled() {
        for _ in 0..200 {
            let token = CancellationToken::new();
            let remote = token.clone();
            let canceller = std::thread::spawn(move || remote.cancel("remote stop"));

            while !token.is_cancelled() {
                std::hint::spin_loop();
            }
            assert_eq!(token.reason(), Some("remote stop".to_string()));
            canceller.join().unwrap();
        }
    }
}

//! Trailing-edge debouncer: a burst of triggers yields one delayed invocation.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Holds at most one armed action; arming a new one disarms the previous.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms `action` to run after the delay, discarding any action that has
    /// not fired yet. Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(prev) = self.slot().replace(token.clone()) {
            trace!("debounced action replaced");
            prev.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // Fired: no longer pending, later schedules must not cancel it.
                    token.cancel();
                    action.await;
                }
            }
        });
    }

    /// Drops the armed action, if any.
    pub fn cancel(&self) {
        if let Some(prev) = self.slot().take() {
            prev.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot().as_ref().is_some_and(|t| !t.is_cancelled())
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Cooperative shutdown signal shared by the node loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Closing flag plus a wakeup for tasks parked on blocking waits.
///
/// Loops poll [`Shutdown::is_closing`] at the top of each iteration. Tasks
/// blocked on something that may never complete (such as `accept`) race it
/// against [`Shutdown::wait`].
#[derive(Debug, Default)]
pub struct Shutdown {
    closing: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    /// Create an untriggered shutdown signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the closing flag and wake all waiters.
    /// Returns `false` if shutdown had already been triggered.
    pub fn trigger(&self) -> bool {
        if self.closing.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    /// Check if shutdown has been signaled (non-blocking).
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is triggered. Returns immediately if it already was.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent trigger is not lost.
        notified.as_mut().enable();
        if self.is_closing() {
            return;
        }
        notified.await;
    }

    /// Sleep for `duration` unless shutdown comes first.
    /// Returns `false` if woken by shutdown.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.wait() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

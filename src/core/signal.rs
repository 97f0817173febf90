//! Completion signal for draining the executor.
//!
//! Backed by a `tokio::sync::watch` channel carrying the number of tasks in
//! flight. The executor publishes the new value from inside its critical
//! section after every admission and every release; waiters suspend until
//! they observe zero. Unlike a one-shot deferral the signal re-arms by itself
//! when new work is admitted, which is what lets `finish()` be called again
//! after more tasks are pushed.

use tokio::sync::watch;

/// Watchable count of admitted-but-unfinished tasks.
#[derive(Debug)]
pub struct DrainSignal {
    tx: watch::Sender<u64>,
}

impl Default for DrainSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl DrainSignal {
    /// Create a signal in the drained state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Publish the current in-flight count, waking waiters if it is zero.
    pub fn publish(&self, in_flight: u64) {
        self.tx.send_replace(in_flight);
    }

    /// Last published in-flight count.
    pub fn in_flight(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Suspend until the in-flight count reaches zero.
    pub async fn drained(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|in_flight| *in_flight == 0).await;
    }
}

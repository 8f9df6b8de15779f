//! Background retry worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use nexus_core::CancellationToken;

use crate::tracker::ProvenanceTracker;

impl ProvenanceTracker {
    /// Run `retry_pending` every `interval` until `token` is cancelled.
    /// Must be called inside a tokio runtime.
    pub fn spawn_retry_worker(
        self: &Arc<Self>,
        interval: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if tracker.pending_retries() > 0 {
                            tracker.retry_pending();
                        }
                    }
                }
            }
            debug!("provenance retry worker stopped");
        })
    }
}

//! ProvenanceTracker: serialized writes, sequence numbers, retry queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, warn};

use nexus_core::config::ProvenanceConfig;
use nexus_core::errors::NexusResult;
use nexus_core::models::ProvenanceRecord;
use nexus_core::traits::{IProvenanceSink, IProvenanceStore};

struct Pending {
    record: ProvenanceRecord,
    attempts: u32,
}

/// Single-writer front for an [`IProvenanceStore`].
///
/// Every record gets a tracker-wide sequence number under the writer lock,
/// so concurrent producers are totally ordered. A failed append is queued
/// for `retry_pending`; after `max_retry_attempts` failures it is dropped
/// and logged at error level.
pub struct ProvenanceTracker {
    store: Arc<dyn IProvenanceStore>,
    config: ProvenanceConfig,
    writer: Mutex<()>,
    sequence: AtomicU64,
    pending: Mutex<VecDeque<Pending>>,
    dropped: AtomicU64,
}

impl ProvenanceTracker {
    pub fn new(store: Arc<dyn IProvenanceStore>, config: ProvenanceConfig) -> Self {
        Self {
            store,
            config,
            writer: Mutex::new(()),
            sequence: AtomicU64::new(0),
            pending: Mutex::new(VecDeque::new()),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ProvenanceConfig {
        &self.config
    }

    /// Events for `subject_id`, oldest first. Ties on timestamp are broken
    /// by sequence number.
    pub fn get_trail(&self, subject_id: &str) -> NexusResult<Vec<ProvenanceRecord>> {
        let mut trail = self.store.trail(subject_id)?;
        trail.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        Ok(trail)
    }

    /// Records waiting for a retry.
    pub fn pending_retries(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Records given up on after exhausting their attempts.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> NexusResult<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> NexusResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Append under the writer lock, assigning a sequence number on first
    /// write. Returns the record back on failure.
    fn write(&self, mut record: ProvenanceRecord) -> Result<(), (ProvenanceRecord, String)> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if record.sequence == 0 {
            record.sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        }
        match self.store.append(&record) {
            Ok(()) => Ok(()),
            Err(e) => Err((record, e.to_string())),
        }
    }

    fn requeue(&self, record: ProvenanceRecord, attempts: u32, reason: &str) {
        if attempts >= self.config.max_retry_attempts {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            error!(
                subject = %record.subject_id,
                kind = %record.kind,
                attempts,
                reason,
                "provenance record dropped after retries"
            );
            return;
        }
        warn!(
            subject = %record.subject_id,
            kind = %record.kind,
            attempts,
            reason,
            "provenance write failed, queued for retry"
        );
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Pending { record, attempts });
    }

    /// Retry every queued record once. Returns how many were written.
    pub fn retry_pending(&self) -> usize {
        let batch = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if batch.is_empty() {
            return 0;
        }
        let mut written = 0;
        for Pending { record, attempts } in batch {
            match self.write(record) {
                Ok(()) => written += 1,
                Err((record, reason)) => self.requeue(record, attempts + 1, &reason),
            }
        }
        debug!(written, remaining = self.pending_retries(), "provenance retry pass");
        written
    }
}

impl IProvenanceSink for ProvenanceTracker {
    fn record(&self, record: ProvenanceRecord) {
        if !self.config.enabled {
            return;
        }
        if let Err((record, reason)) = self.write(record) {
            self.requeue(record, 1, &reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::provenance::components;
    use nexus_core::models::DerivationKind;
    use test_fixtures::FlakyProvenanceStore;

    fn rec(subject: &str) -> ProvenanceRecord {
        ProvenanceRecord::new(subject, DerivationKind::EntityCreated, vec![], components::GRAPH)
    }

    fn tracker(store: Arc<FlakyProvenanceStore>, max_retry_attempts: u32) -> ProvenanceTracker {
        ProvenanceTracker::new(
            store,
            ProvenanceConfig {
                max_retry_attempts,
                ..ProvenanceConfig::default()
            },
        )
    }

    #[test]
    fn sequence_numbers_increase() {
        let store = Arc::new(FlakyProvenanceStore::new());
        let tracker = tracker(store.clone(), 3);
        tracker.record(rec("a"));
        tracker.record(rec("a"));
        let seqs: Vec<u64> = store.records().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn failed_write_is_queued_and_retried() {
        let store = Arc::new(FlakyProvenanceStore::new());
        let tracker = tracker(store.clone(), 3);
        store.fail_next(1);
        tracker.record(rec("a"));
        assert_eq!(tracker.pending_retries(), 1);
        assert!(store.records().is_empty());

        assert_eq!(tracker.retry_pending(), 1);
        assert_eq!(tracker.pending_retries(), 0);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].sequence, 1);
    }

    #[test]
    fn record_is_dropped_after_max_attempts() {
        let store = Arc::new(FlakyProvenanceStore::new());
        let tracker = tracker(store.clone(), 2);
        store.fail_next(10);
        tracker.record(rec("a"));
        tracker.retry_pending();
        assert_eq!(tracker.pending_retries(), 0);
        assert_eq!(tracker.dropped(), 1);
        assert_eq!(store.attempts(), 2);
    }

    #[test]
    fn disabled_tracker_records_nothing() {
        let store = Arc::new(FlakyProvenanceStore::new());
        let tracker = ProvenanceTracker::new(
            store.clone(),
            ProvenanceConfig {
                enabled: false,
                ..ProvenanceConfig::default()
            },
        );
        tracker.record(rec("a"));
        assert_eq!(store.attempts(), 0);
    }
}

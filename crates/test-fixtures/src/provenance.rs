//! Provenance store that fails on demand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use nexus_core::errors::{NexusResult, ProvenanceError};
use nexus_core::models::ProvenanceRecord;
use nexus_core::traits::IProvenanceStore;

/// Append-only vector store whose next `n` appends fail.
#[derive(Default)]
pub struct FlakyProvenanceStore {
    records: Mutex<Vec<ProvenanceRecord>>,
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
}

impl FlakyProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` appends.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Total append attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<ProvenanceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl IProvenanceStore for FlakyProvenanceStore {
    fn append(&self, record: &ProvenanceRecord) -> NexusResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(ProvenanceError::StoreUnavailable {
                reason: "injected failure".into(),
            }
            .into());
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn trail(&self, subject_id: &str) -> NexusResult<Vec<ProvenanceRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect())
    }

    fn len(&self) -> NexusResult<usize> {
        Ok(self.records.lock().unwrap().len())
    }
}

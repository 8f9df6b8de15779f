//! In-process provenance store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use nexus_core::errors::NexusResult;
use nexus_core::models::ProvenanceRecord;
use nexus_core::traits::IProvenanceStore;

#[derive(Default)]
struct Log {
    records: Vec<ProvenanceRecord>,
    by_subject: HashMap<String, Vec<usize>>,
}

/// Append-only log held in memory, indexed by subject id.
#[derive(Default)]
pub struct MemoryProvenanceStore {
    log: RwLock<Log>,
}

impl MemoryProvenanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IProvenanceStore for MemoryProvenanceStore {
    fn append(&self, record: &ProvenanceRecord) -> NexusResult<()> {
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        let index = log.records.len();
        log.records.push(record.clone());
        log.by_subject
            .entry(record.subject_id.clone())
            .or_default()
            .push(index);
        Ok(())
    }

    fn trail(&self, subject_id: &str) -> NexusResult<Vec<ProvenanceRecord>> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        Ok(log
            .by_subject
            .get(subject_id)
            .map(|indices| indices.iter().map(|i| log.records[*i].clone()).collect())
            .unwrap_or_default())
    }

    fn len(&self) -> NexusResult<usize> {
        Ok(self
            .log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::provenance::components;
    use nexus_core::models::DerivationKind;

    #[test]
    fn trail_is_per_subject_in_insertion_order() {
        let store = MemoryProvenanceStore::new();
        for kind in [DerivationKind::EntityCreated, DerivationKind::EntityUpdated] {
            store
                .append(&ProvenanceRecord::new("e1", kind, vec![], components::GRAPH))
                .unwrap();
        }
        store
            .append(&ProvenanceRecord::new(
                "e2",
                DerivationKind::EntityCreated,
                vec![],
                components::GRAPH,
            ))
            .unwrap();

        let trail = store.trail("e1").unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[1].kind, DerivationKind::EntityUpdated);
        assert_eq!(store.len().unwrap(), 3);
        assert!(store.trail("missing").unwrap().is_empty());
    }
}

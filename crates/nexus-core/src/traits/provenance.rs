use crate::errors::NexusResult;
use crate::models::ProvenanceRecord;

/// Write side of provenance, handed to every producing component.
/// Recording never fails the caller.
pub trait IProvenanceSink: Send + Sync {
    fn record(&self, record: ProvenanceRecord);
}

/// Durable append-only provenance storage.
pub trait IProvenanceStore: Send + Sync {
    fn append(&self, record: &ProvenanceRecord) -> NexusResult<()>;

    /// All records for `subject_id`, in insertion order.
    fn trail(&self, subject_id: &str) -> NexusResult<Vec<ProvenanceRecord>>;

    fn len(&self) -> NexusResult<usize>;
}

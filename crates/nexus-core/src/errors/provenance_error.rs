/// Provenance store errors. Never surfaced through the operation being recorded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProvenanceError {
    #[error("provenance store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

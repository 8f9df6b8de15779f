/// Multi-hop reasoning errors. Budget exhaustion is not an error; it is
/// reported through `ReasoningResult::truncated`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReasoningError {
    #[error("unknown entity: {id}")]
    UnknownEntity { id: String },

    #[error("invalid reasoning options: {reason}")]
    InvalidOptions { reason: String },
}

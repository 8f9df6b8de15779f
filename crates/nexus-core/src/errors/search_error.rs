/// Hybrid search errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// Vector recall is mandatory, so this fails the request.
    #[error("vector search unavailable: {reason}")]
    VectorSearchUnavailable { reason: String },

    #[error("embedding failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}

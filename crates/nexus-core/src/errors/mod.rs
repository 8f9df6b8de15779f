//! Error taxonomy. One enum per subsystem, aggregated by [`NexusError`].

pub mod config_error;
pub mod extraction_error;
pub mod graph_error;
pub mod pipeline_error;
pub mod provenance_error;
pub mod reasoning_error;
pub mod search_error;

pub use config_error::ConfigError;
pub use extraction_error::ExtractionError;
pub use graph_error::GraphError;
pub use pipeline_error::PipelineError;
pub use provenance_error::ProvenanceError;
pub use reasoning_error::ReasoningError;
pub use search_error::SearchError;

/// Top-level error for every Nexus operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NexusError {
    #[error("extraction error: {0}")]
    ExtractionError(#[from] ExtractionError),

    #[error("graph error: {0}")]
    GraphError(#[from] GraphError),

    #[error("search error: {0}")]
    SearchError(#[from] SearchError),

    #[error("reasoning error: {0}")]
    ReasoningError(#[from] ReasoningError),

    #[error("provenance error: {0}")]
    ProvenanceError(#[from] ProvenanceError),

    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("pipeline error: {0}")]
    PipelineError(#[from] PipelineError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for NexusError {
    fn from(e: serde_json::Error) -> Self {
        NexusError::Serialization(e.to_string())
    }
}

impl NexusError {
    /// Whether this error means the graph store is down, in which case
    /// search degrades to vector-only instead of failing.
    pub fn is_graph_unavailable(&self) -> bool {
        matches!(
            self,
            NexusError::GraphError(GraphError::GraphUnavailable { .. })
        )
    }

    /// Whether this error is a lost merge race that is worth retrying.
    pub fn is_merge_conflict(&self) -> bool {
        matches!(self, NexusError::GraphError(GraphError::MergeConflict { .. }))
    }
}

pub type NexusResult<T> = Result<T, NexusError>;

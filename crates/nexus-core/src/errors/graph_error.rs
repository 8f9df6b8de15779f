/// Knowledge graph manager errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("entity not found: {id}")]
    EntityNotFound { id: String },

    #[error("relationship not found: {id}")]
    RelationshipNotFound { id: String },

    #[error("relationship endpoint {entity_id} does not reference an active entity")]
    DanglingEndpoint { entity_id: String },

    #[error("merge conflict on {entity_id} after {attempts} attempts")]
    MergeConflict { entity_id: String, attempts: u32 },

    #[error("invalid entity: {reason}")]
    InvalidEntity { reason: String },

    #[error("invalid merge: {reason}")]
    InvalidMerge { reason: String },

    #[error("graph store unavailable: {reason}")]
    GraphUnavailable { reason: String },
}

//! The knowledge graph data model.

pub mod chunk;
pub mod confidence;
pub mod entity;
pub mod extraction;
pub mod mention;
pub mod provenance;
pub mod ranking;
pub mod reasoning;
pub mod relationship;
pub mod statistics;

pub use chunk::{Chunk, ChunkFilter, ContextHints};
pub use confidence::Confidence;
pub use entity::{Entity, EntityFilter, EntityType};
pub use extraction::{CandidateEntity, CandidateMention, CandidateRelationship, ExtractionOutput};
pub use mention::{ExtractionMethod, Mention, Span};
pub use provenance::{DerivationKind, ProvenanceRecord};
pub use ranking::{CandidateSource, RankedCandidate, SearchCandidate, SignalBreakdown};
pub use reasoning::{Hop, ReasoningMode, ReasoningPath, ReasoningResult};
pub use relationship::{Relationship, RelationshipFilter, RelationshipKey, RelationshipType};
pub use statistics::{ConsistencyReport, ConsistencyViolation, GraphStatistics};

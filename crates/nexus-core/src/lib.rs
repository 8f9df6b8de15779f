//! # nexus-core
//!
//! Foundation crate for the Nexus knowledge graph.
//! Defines the data model, capability traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod cancellation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod similarity;
pub mod spans;
pub mod text;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use cancellation::CancellationToken;
pub use config::{NexusConfig, Preset};
pub use errors::{NexusError, NexusResult};
pub use models::{
    Confidence, Entity, EntityType, ExtractionMethod, Mention, Relationship, RelationshipType,
};

//! # nexus-graph
//!
//! The canonical entity/relationship store. Entities and relationships live
//! in id-keyed concurrent maps; relationships reference entities by id only.
//!
//! Mutations touching the same entity are serialized by striped locks;
//! unrelated mutations proceed in parallel. Merged-away entities stay behind
//! as redirects so a concurrent reader never follows an id into nothing.

pub mod dedup;
pub mod locks;
pub mod merge;
pub mod read;
pub mod stats;
pub mod store;
pub mod upsert;
pub mod validation;

pub use dedup::{DedupCandidate, SimilarNode};
pub use merge::MergeReport;
pub use read::{GraphRead, Neighbor};
pub use store::GraphStore;
pub use upsert::{UpsertAction, UpsertOutcome};

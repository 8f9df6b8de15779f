use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Graph-level counts and histograms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    /// Active (non-merged) entities.
    pub node_count: usize,
    pub edge_count: usize,
    /// Edges over possible directed edges, `E / (N * (N - 1))`.
    pub density: f64,
    pub entity_types: BTreeMap<String, usize>,
    pub relationship_types: BTreeMap<String, usize>,
    pub merged_count: usize,
    pub mention_count: usize,
    pub average_entity_confidence: f64,
    pub connected_components: usize,
    pub pending_dedup_candidates: usize,
}

/// A single integrity violation found by `validate_consistency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyViolation {
    DanglingEdge {
        relationship_id: String,
        missing_entity_id: String,
    },
    EdgeToMergedEntity {
        relationship_id: String,
        merged_entity_id: String,
    },
    OrphanMention {
        entity_id: String,
        chunk_id: String,
        reason: String,
    },
    ConfidenceOutOfRange {
        subject_id: String,
        value: f64,
    },
    EmptyAliasSet {
        entity_id: String,
    },
    CanonicalNameNotAliased {
        entity_id: String,
    },
    SelfLoop {
        relationship_id: String,
    },
    BrokenRedirect {
        entity_id: String,
        merged_into: String,
    },
}

impl fmt::Display for ConsistencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEdge {
                relationship_id,
                missing_entity_id,
            } => write!(
                f,
                "relationship {relationship_id} references missing entity {missing_entity_id}"
            ),
            Self::EdgeToMergedEntity {
                relationship_id,
                merged_entity_id,
            } => write!(
                f,
                "relationship {relationship_id} references merged-away entity {merged_entity_id}"
            ),
            Self::OrphanMention {
                entity_id,
                chunk_id,
                reason,
            } => write!(f, "orphan mention on {entity_id} in chunk {chunk_id}: {reason}"),
            Self::ConfidenceOutOfRange { subject_id, value } => {
                write!(f, "confidence {value} out of range on {subject_id}")
            }
            Self::EmptyAliasSet { entity_id } => write!(f, "entity {entity_id} has no aliases"),
            Self::CanonicalNameNotAliased { entity_id } => {
                write!(f, "entity {entity_id} canonical name missing from aliases")
            }
            Self::SelfLoop { relationship_id } => {
                write!(f, "relationship {relationship_id} is a self loop")
            }
            Self::BrokenRedirect {
                entity_id,
                merged_into,
            } => write!(f, "entity {entity_id} redirects to missing {merged_into}"),
        }
    }
}

/// Result of a consistency scan. Violations are reported, never repaired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub entities_checked: usize,
    pub relationships_checked: usize,
    pub violations: Vec<ConsistencyViolation>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

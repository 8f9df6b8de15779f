use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::relationship::RelationshipType;

/// `Targeted` when target entities are supplied, otherwise `Exploratory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    Targeted,
    Exploratory,
}

/// One edge traversal in a reasoning path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    pub from_entity_id: String,
    pub from_name: String,
    pub relationship_id: String,
    pub relationship_type: RelationshipType,
    pub to_entity_id: String,
    pub to_name: String,
    /// Confidence of the traversed relationship.
    pub edge_confidence: Confidence,
    /// Path confidence after this hop.
    pub cumulative_confidence: Confidence,
    /// True when a directed relationship was walked target → source.
    pub inverse: bool,
    /// Chunk ids backing the traversed relationship.
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// An ordered hop list from a start entity, with cumulative confidence that
/// never increases along the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningPath {
    pub start_entity_id: String,
    pub hops: Vec<Hop>,
    pub confidence: Confidence,
    pub explanation: String,
}

impl ReasoningPath {
    pub fn depth(&self) -> usize {
        self.hops.len()
    }

    pub fn end_entity_id(&self) -> &str {
        self.hops
            .last()
            .map(|h| h.to_entity_id.as_str())
            .unwrap_or(&self.start_entity_id)
    }

    /// Entity ids in visit order, start included.
    pub fn entity_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.start_entity_id.as_str()];
        ids.extend(self.hops.iter().map(|h| h.to_entity_id.as_str()));
        ids
    }

    /// Evidence chunk ids across all hops, first occurrence order.
    pub fn evidence_chunks(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for hop in &self.hops {
            for chunk in &hop.evidence {
                if !out.contains(chunk) {
                    out.push(chunk.clone());
                }
            }
        }
        out
    }
}

/// Output of a reasoning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningResult {
    pub mode: ReasoningMode,
    pub paths: Vec<ReasoningPath>,
    /// The expansion budget ran out before exploration finished; `paths`
    /// holds the best-effort results found so far.
    pub truncated: bool,
    pub nodes_expanded: usize,
    pub explanation: String,
}

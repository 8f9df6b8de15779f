use serde::{Deserialize, Serialize};

use nexus_core::config::ReasoningConfig;
use nexus_core::constants::{MAX_EXPANDED_NODES, MAX_REASONING_DEPTH};
use nexus_core::errors::{NexusResult, ReasoningError};
use nexus_core::models::RelationshipType;

/// Per-request reasoning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningOptions {
    pub max_depth: usize,
    /// Paths whose confidence falls below this are pruned.
    pub min_confidence: f64,
    pub max_paths: usize,
    pub max_expanded_nodes: usize,
    pub traverse_inverse: bool,
    /// Only walk these relationship types. Empty means all.
    pub relationship_types: Vec<RelationshipType>,
}

impl Default for ReasoningOptions {
    fn default() -> Self {
        Self::from_config(&ReasoningConfig::default())
    }
}

impl ReasoningOptions {
    pub fn from_config(config: &ReasoningConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            min_confidence: config.min_confidence,
            max_paths: config.max_paths,
            max_expanded_nodes: config.max_expanded_nodes,
            traverse_inverse: config.traverse_inverse,
            relationship_types: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn validate(&self) -> NexusResult<()> {
        let invalid = |reason: String| -> NexusResult<()> {
            Err(ReasoningError::InvalidOptions { reason }.into())
        };
        if self.max_depth == 0 || self.max_depth > MAX_REASONING_DEPTH {
            return invalid(format!(
                "max_depth {} outside 1..={MAX_REASONING_DEPTH}",
                self.max_depth
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return invalid(format!("min_confidence {} outside [0, 1]", self.min_confidence));
        }
        if self.max_paths == 0 {
            return invalid("max_paths must be greater than zero".to_string());
        }
        if self.max_expanded_nodes == 0 || self.max_expanded_nodes > MAX_EXPANDED_NODES {
            return invalid(format!(
                "max_expanded_nodes {} outside 1..={MAX_EXPANDED_NODES}",
                self.max_expanded_nodes
            ));
        }
        Ok(())
    }

    pub(crate) fn allows(&self, relationship_type: RelationshipType) -> bool {
        self.relationship_types.is_empty() || self.relationship_types.contains(&relationship_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        ReasoningOptions::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(ReasoningOptions::default().with_max_depth(0).validate().is_err());
        assert!(ReasoningOptions::default()
            .with_max_depth(MAX_REASONING_DEPTH + 1)
            .validate()
            .is_err());
        assert!(ReasoningOptions::default()
            .with_min_confidence(1.5)
            .validate()
            .is_err());
    }
}

use serde::{Deserialize, Serialize};

use super::defaults;

/// Multi-hop reasoning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub max_depth: usize,
    pub min_confidence: f64,
    /// Top-N paths returned in exploratory mode.
    pub max_paths: usize,
    /// Global expansion cap; the only termination guarantee for dense graphs.
    pub max_expanded_nodes: usize,
    /// Allow walking directed relationships from target to source.
    pub traverse_inverse: bool,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_depth: defaults::DEFAULT_MAX_DEPTH,
            min_confidence: defaults::DEFAULT_REASONING_MIN_CONFIDENCE,
            max_paths: defaults::DEFAULT_MAX_PATHS,
            max_expanded_nodes: defaults::DEFAULT_MAX_EXPANDED_NODES,
            traverse_inverse: defaults::DEFAULT_TRAVERSE_INVERSE,
        }
    }
}

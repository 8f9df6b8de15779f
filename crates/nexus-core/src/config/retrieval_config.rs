use serde::{Deserialize, Serialize};

use super::defaults;

/// Hybrid search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Top-K requested from vector search.
    pub vector_k: usize,
    pub default_limit: usize,
    /// One-hop graph expansion from anchors.
    pub expand: bool,
    /// Maximum number of graph-only chunks added by expansion.
    pub max_expansion: usize,
    /// Graph score multiplier applied per expansion hop.
    pub expansion_decay: f64,
    pub min_anchor_confidence: f64,
    pub max_anchors: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_k: defaults::DEFAULT_VECTOR_K,
            default_limit: defaults::DEFAULT_SEARCH_LIMIT,
            expand: defaults::DEFAULT_EXPAND,
            max_expansion: defaults::DEFAULT_MAX_EXPANSION,
            expansion_decay: defaults::DEFAULT_EXPANSION_DECAY,
            min_anchor_confidence: defaults::DEFAULT_MIN_ANCHOR_CONFIDENCE,
            max_anchors: defaults::DEFAULT_MAX_ANCHORS,
        }
    }
}

/// Signal weights for rank fusion. Weights are normalized to sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub vector_weight: f64,
    pub graph_weight: f64,
    pub recency_weight: f64,
    pub recency_half_life_days: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            vector_weight: defaults::DEFAULT_VECTOR_WEIGHT,
            graph_weight: defaults::DEFAULT_GRAPH_WEIGHT,
            recency_weight: defaults::DEFAULT_RECENCY_WEIGHT,
            recency_half_life_days: defaults::DEFAULT_RECENCY_HALF_LIFE_DAYS,
        }
    }
}

/// Query optimizer cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_entries: u64,
    /// Decimal places kept when hashing query embeddings.
    pub embedding_precision: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_CACHE_ENABLED,
            ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            max_entries: defaults::DEFAULT_CACHE_MAX_ENTRIES,
            embedding_precision: defaults::DEFAULT_EMBEDDING_PRECISION,
        }
    }
}

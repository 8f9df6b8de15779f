use serde::{Deserialize, Serialize};

use super::defaults;

/// Graph manager configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Similarity at or above which a new entity is a duplicate.
    pub dedup_threshold: f64,
    /// Similarity at or above which a pair is flagged for later resolution.
    pub candidate_threshold: f64,
    pub auto_merge: bool,
    /// Use embedding cosine similarity during dedup when embeddings exist.
    pub use_embeddings: bool,
    /// Number of striped mutation locks.
    pub lock_stripes: usize,
    pub merge_retry_limit: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: defaults::DEFAULT_DEDUP_THRESHOLD,
            candidate_threshold: defaults::DEFAULT_CANDIDATE_THRESHOLD,
            auto_merge: defaults::DEFAULT_AUTO_MERGE,
            use_embeddings: defaults::DEFAULT_USE_EMBEDDINGS,
            lock_stripes: defaults::DEFAULT_LOCK_STRIPES,
            merge_retry_limit: defaults::DEFAULT_MERGE_RETRY_LIMIT,
        }
    }
}

use serde::{Deserialize, Serialize};

use nexus_core::config::SearchConfig;
use nexus_core::errors::{NexusResult, SearchError};
use nexus_core::models::{ChunkFilter, EntityType};

/// Per-request search options. Unset fields fall back to [`SearchConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Maximum ranked results returned.
    pub limit: usize,
    /// Top-K requested from vector search.
    pub vector_k: usize,
    /// One-hop graph expansion from anchors.
    pub expand: bool,
    /// Maximum graph-only chunks added by expansion.
    pub max_expansion: usize,
    pub filters: ChunkFilter,
    /// Restrict anchors and expanded neighbors to these types. Empty means all.
    pub entity_types: Vec<EntityType>,
}

impl SearchOptions {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            limit: config.default_limit,
            vector_k: config.vector_k,
            expand: config.expand,
            max_expansion: config.max_expansion,
            filters: ChunkFilter::default(),
            entity_types: Vec::new(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_filters(mut self, filters: ChunkFilter) -> Self {
        self.filters = filters;
        self
    }

    pub fn validate(&self) -> NexusResult<()> {
        if self.limit == 0 {
            return Err(invalid("limit must be at least 1"));
        }
        if self.vector_k == 0 {
            return Err(invalid("vector_k must be at least 1"));
        }
        Ok(())
    }

    pub(crate) fn allows(&self, entity_type: EntityType) -> bool {
        self.entity_types.is_empty() || self.entity_types.contains(&entity_type)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

fn invalid(reason: &str) -> nexus_core::NexusError {
    SearchError::InvalidQuery {
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config() {
        let opts = SearchOptions::default();
        assert_eq!(opts.limit, 10);
        assert_eq!(opts.vector_k, 20);
        assert!(opts.expand);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(SearchOptions::default().with_limit(0).validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: SearchOptions = serde_json::from_str(r#"{"limit": 3}"#).unwrap();
        assert_eq!(opts.limit, 3);
        assert_eq!(opts.max_expansion, 30);
    }
}

//! Configuration for every Nexus component.
//!
//! Config values are immutable structs passed explicitly into constructors.
//! Presets produce a complete `NexusConfig`; TOML files override individual
//! fields on top of the defaults.

pub mod defaults;
pub mod extraction_config;
pub mod graph_config;
pub mod pipeline_config;
pub mod reasoning_config;
pub mod retrieval_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, NexusResult};

pub use extraction_config::{DictionaryEntry, ExtractionConfig, ExtractionMethodConfig};
pub use graph_config::GraphConfig;
pub use pipeline_config::{PipelineConfig, ProvenanceConfig};
pub use reasoning_config::ReasoningConfig;
pub use retrieval_config::{OptimizerConfig, RankingConfig, SearchConfig};

/// Tuning presets trading recall against precision and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Strict thresholds, conservative merging.
    Accuracy,
    /// Loose thresholds, wide expansion.
    Coverage,
    /// Small budgets, long-lived cache.
    Performance,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    pub extraction: ExtractionConfig,
    pub graph: GraphConfig,
    pub search: SearchConfig,
    pub ranking: RankingConfig,
    pub reasoning: ReasoningConfig,
    pub optimizer: OptimizerConfig,
    pub provenance: ProvenanceConfig,
    pub pipeline: PipelineConfig,
}

impl NexusConfig {
    pub fn preset(preset: Preset) -> Self {
        let mut config = Self::default();
        match preset {
            Preset::Accuracy => {
                config.extraction.min_entity_confidence = 0.65;
                config.extraction.min_relationship_confidence = 0.55;
                config.graph.dedup_threshold = 0.9;
                config.graph.candidate_threshold = 0.75;
                config.reasoning.min_confidence = 0.2;
                config.reasoning.max_expanded_nodes = 2_000;
            }
            Preset::Coverage => {
                config.extraction.min_entity_confidence = 0.35;
                config.extraction.min_relationship_confidence = 0.3;
                config.extraction.context_window = 250;
                config.graph.dedup_threshold = 0.7;
                config.graph.candidate_threshold = 0.5;
                config.search.vector_k = 40;
                config.search.max_expansion = 60;
                config.reasoning.max_depth = 4;
                config.reasoning.max_paths = 20;
                config.reasoning.min_confidence = 0.05;
            }
            Preset::Performance => {
                config.extraction.enable_co_occurrence = false;
                config.extraction.max_entities_per_chunk = 25;
                config.graph.dedup_threshold = 0.8;
                config.graph.candidate_threshold = 0.65;
                config.search.vector_k = 10;
                config.search.max_expansion = 10;
                config.reasoning.max_depth = 2;
                config.reasoning.max_expanded_nodes = 250;
                config.optimizer.ttl_secs = 900;
            }
        }
        config
    }

    /// Parse a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> NexusResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> NexusResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges across all sections.
    pub fn validate(&self) -> NexusResult<()> {
        let unit = [
            ("extraction.min_entity_confidence", self.extraction.min_entity_confidence),
            (
                "extraction.min_relationship_confidence",
                self.extraction.min_relationship_confidence,
            ),
            ("graph.dedup_threshold", self.graph.dedup_threshold),
            ("graph.candidate_threshold", self.graph.candidate_threshold),
            ("search.expansion_decay", self.search.expansion_decay),
            ("search.min_anchor_confidence", self.search.min_anchor_confidence),
            ("reasoning.min_confidence", self.reasoning.min_confidence),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("{value} is outside [0, 1]")));
            }
        }

        let non_zero = [
            ("extraction.max_entities_per_chunk", self.extraction.max_entities_per_chunk),
            ("graph.lock_stripes", self.graph.lock_stripes),
            ("search.vector_k", self.search.vector_k),
            ("reasoning.max_depth", self.reasoning.max_depth),
            ("reasoning.max_expanded_nodes", self.reasoning.max_expanded_nodes),
            ("pipeline.max_concurrency", self.pipeline.max_concurrency),
            ("pipeline.queue_capacity", self.pipeline.queue_capacity),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero".to_string()));
            }
        }

        if self.graph.candidate_threshold > self.graph.dedup_threshold {
            return Err(invalid(
                "graph.candidate_threshold",
                "must not exceed graph.dedup_threshold".to_string(),
            ));
        }

        let weights = [
            self.ranking.vector_weight,
            self.ranking.graph_weight,
            self.ranking.recency_weight,
        ];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(invalid("ranking", "weights must be non-negative".to_string()));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(invalid("ranking", "weights must have a positive sum".to_string()));
        }
        if self.ranking.recency_half_life_days <= 0.0 {
            return Err(invalid(
                "ranking.recency_half_life_days",
                "must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> crate::errors::NexusError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason,
    }
    .into()
}

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::EntityType;

/// A known (name, type) pair for dictionary extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub name: String,
    pub entity_type: EntityType,
}

/// Per-method extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ExtractionMethodConfig {
    /// Capitalized-span NER and relation patterns.
    Pattern {
        entity_confidence: f64,
        relationship_confidence: f64,
    },
    /// `related_to` edges between entities inside the context window.
    /// Confidence decays linearly with distance down to `floor`.
    CoOccurrence { base_confidence: f64, floor: f64 },
    /// Case-insensitive matching of configured names.
    Dictionary {
        entries: Vec<DictionaryEntry>,
        confidence: f64,
    },
}

impl ExtractionMethodConfig {
    pub fn default_pattern() -> Self {
        Self::Pattern {
            entity_confidence: defaults::DEFAULT_PATTERN_ENTITY_CONFIDENCE,
            relationship_confidence: defaults::DEFAULT_PATTERN_RELATIONSHIP_CONFIDENCE,
        }
    }

    pub fn default_co_occurrence() -> Self {
        Self::CoOccurrence {
            base_confidence: defaults::DEFAULT_CO_OCCURRENCE_CONFIDENCE,
            floor: 0.2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pattern { .. } => "pattern",
            Self::CoOccurrence { .. } => "co_occurrence",
            Self::Dictionary { .. } => "dictionary",
        }
    }
}

/// Extractor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub min_entity_confidence: f64,
    pub min_relationship_confidence: f64,
    /// Character window for co-occurrence analysis.
    pub context_window: usize,
    pub max_entities_per_chunk: usize,
    pub enable_co_occurrence: bool,
    /// Chunks longer than this fail extraction.
    pub max_chunk_chars: usize,
    pub methods: Vec<ExtractionMethodConfig>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_entity_confidence: defaults::DEFAULT_MIN_ENTITY_CONFIDENCE,
            min_relationship_confidence: defaults::DEFAULT_MIN_RELATIONSHIP_CONFIDENCE,
            context_window: defaults::DEFAULT_CONTEXT_WINDOW,
            max_entities_per_chunk: defaults::DEFAULT_MAX_ENTITIES_PER_CHUNK,
            enable_co_occurrence: defaults::DEFAULT_ENABLE_CO_OCCURRENCE,
            max_chunk_chars: defaults::DEFAULT_MAX_CHUNK_CHARS,
            methods: vec![
                ExtractionMethodConfig::default_pattern(),
                ExtractionMethodConfig::default_co_occurrence(),
            ],
        }
    }
}

impl ExtractionConfig {
    /// Pattern parameters, or the defaults when the method is not configured.
    pub fn pattern_params(&self) -> Option<(f64, f64)> {
        self.methods.iter().find_map(|m| match m {
            ExtractionMethodConfig::Pattern {
                entity_confidence,
                relationship_confidence,
            } => Some((*entity_confidence, *relationship_confidence)),
            _ => None,
        })
    }

    pub fn co_occurrence_params(&self) -> Option<(f64, f64)> {
        if !self.enable_co_occurrence {
            return None;
        }
        self.methods
            .iter()
            .find_map(|m| match m {
                ExtractionMethodConfig::CoOccurrence {
                    base_confidence,
                    floor,
                } => Some((*base_confidence, *floor)),
                _ => None,
            })
            .or(Some((defaults::DEFAULT_CO_OCCURRENCE_CONFIDENCE, 0.2)))
    }

    pub fn dictionary(&self) -> Vec<(&DictionaryEntry, f64)> {
        self.methods
            .iter()
            .flat_map(|m| match m {
                ExtractionMethodConfig::Dictionary {
                    entries,
                    confidence,
                } => entries.iter().map(|e| (e, *confidence)).collect::<Vec<_>>(),
                _ => Vec::new(),
            })
            .collect()
    }
}

//! Extractor output shape consumed by the graph manager and pipeline.

use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::entity::EntityType;
use super::mention::{ExtractionMethod, Span};
use super::relationship::RelationshipType;

/// A candidate entity found in one chunk, before graph deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEntity {
    /// Chunk-local key (normalized name). Relationships refer to entities by this key.
    pub key: String,
    pub name: String,
    pub entity_type: EntityType,
    pub confidence: Confidence,
    /// Surface forms seen in the chunk, including `name`.
    pub aliases: Vec<String>,
    pub mentions: Vec<CandidateMention>,
}

/// A single occurrence of a candidate entity inside the chunk text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateMention {
    pub span: Span,
    pub method: ExtractionMethod,
    pub confidence: Confidence,
}

/// A candidate relationship between two chunk-local entity keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRelationship {
    pub source_key: String,
    pub target_key: String,
    pub relationship_type: RelationshipType,
    pub confidence: Confidence,
    pub directed: bool,
    pub method: ExtractionMethod,
}

/// Everything extracted from one chunk.
///
/// A chunk that failed to extract carries `error` and no entities; callers
/// log and continue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub chunk_id: String,
    pub entities: Vec<CandidateEntity>,
    pub relationships: Vec<CandidateRelationship>,
    /// Candidates dropped by threshold or the per-chunk cap.
    pub dropped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutput {
    pub fn empty(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            ..Default::default()
        }
    }

    pub fn failed(chunk_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn mention_count(&self) -> usize {
        self.entities.iter().map(|e| e.mentions.len()).sum()
    }

    pub fn entity(&self, key: &str) -> Option<&CandidateEntity> {
        self.entities.iter().find(|e| e.key == key)
    }
}

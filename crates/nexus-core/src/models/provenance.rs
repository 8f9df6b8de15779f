use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of derivation a provenance record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationKind {
    EntityCreated,
    EntityUpdated,
    RelationshipCreated,
    RelationshipUpdated,
    EntityMerged,
    QueryDerivation,
    ReasoningDerivation,
}

impl DerivationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EntityCreated => "entity_created",
            Self::EntityUpdated => "entity_updated",
            Self::RelationshipCreated => "relationship_created",
            Self::RelationshipUpdated => "relationship_updated",
            Self::EntityMerged => "entity_merged",
            Self::QueryDerivation => "query_derivation",
            Self::ReasoningDerivation => "reasoning_derivation",
        }
    }
}

impl fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the component that produced a record.
pub mod components {
    pub const EXTRACTOR: &str = "extractor";
    pub const GRAPH: &str = "graph_manager";
    pub const SEARCH: &str = "hybrid_search";
    pub const REASONING: &str = "reasoning";
    pub const RANKING: &str = "ranking";
    pub const PIPELINE: &str = "pipeline";
}

/// An append-only derivation log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub id: String,
    pub subject_id: String,
    pub kind: DerivationKind,
    pub input_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub component: String,
    /// Assigned by the tracker; breaks timestamp ties.
    #[serde(default)]
    pub sequence: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl ProvenanceRecord {
    pub fn new(
        subject_id: impl Into<String>,
        kind: DerivationKind,
        input_ids: Vec<String>,
        component: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            kind,
            input_ids,
            timestamp: Utc::now(),
            component: component.to_string(),
            sequence: 0,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

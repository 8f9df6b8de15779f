use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::EntityType;

/// An ingested text chunk as delivered by the chunk store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    /// File / document the chunk belongs to.
    pub source_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<ContextHints>,
}

impl Chunk {
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            text: text.into(),
            created_at: None,
            hints: None,
        }
    }

    pub fn with_hints(mut self, hints: ContextHints) -> Self {
        self.hints = Some(hints);
        self
    }
}

/// Optional per-chunk extraction hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextHints {
    /// Names known to appear in this chunk's document, with their types.
    pub known_entities: Vec<(String, EntityType)>,
    pub document_title: Option<String>,
}

/// Opaque-to-the-core filter forwarded to the chunk store and vector search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkFilter {
    /// Restrict to chunks from these files/documents.
    pub source_ids: Vec<String>,
    /// Restrict to these chunk ids.
    pub chunk_ids: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ChunkFilter {
    pub fn for_sources(source_ids: Vec<String>) -> Self {
        Self {
            source_ids,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source_ids.is_empty() && self.chunk_ids.is_empty() && self.metadata.is_empty()
    }

    pub fn matches(&self, chunk: &Chunk) -> bool {
        (self.source_ids.is_empty() || self.source_ids.contains(&chunk.source_id))
            && (self.chunk_ids.is_empty() || self.chunk_ids.contains(&chunk.id))
    }

    /// Stable textual form, used for cache signatures.
    pub fn canonical(&self) -> String {
        let mut sources = self.source_ids.clone();
        sources.sort();
        let mut chunks = self.chunk_ids.clone();
        chunks.sort();
        let meta: Vec<String> = self
            .metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!(
            "sources:{}|chunks:{}|meta:{}",
            sources.join(","),
            chunks.join(","),
            meta.join(",")
        )
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::mention::Mention;
use crate::text::normalize_name;

/// The kinds of entity the extractor and graph understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Product,
    Technology,
    Event,
    Concept,
    Date,
    Other,
}

impl EntityType {
    pub const COUNT: usize = 9;

    pub const ALL: [EntityType; 9] = [
        Self::Person,
        Self::Organization,
        Self::Location,
        Self::Product,
        Self::Technology,
        Self::Event,
        Self::Concept,
        Self::Date,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Location => "location",
            Self::Product => "product",
            Self::Technology => "technology",
            Self::Event => "event",
            Self::Concept => "concept",
            Self::Date => "date",
            Self::Other => "other",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Generic types yield to a more specific one when the same name is
    /// typed differently by two extraction methods.
    pub fn is_generic(self) -> bool {
        matches!(self, Self::Concept | Self::Other)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deduplicated named concept in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// UUID v4 identifier.
    pub id: String,
    pub canonical_name: String,
    pub entity_type: EntityType,
    /// Always contains at least the canonical name.
    pub aliases: BTreeSet<String>,
    pub confidence: Confidence,
    pub mentions: Vec<Mention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when this entity was merged into another. Merged-away entities
    /// stay in the arena as redirects and are never physically deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<String>,
}

impl Entity {
    /// Create a fresh entity with a new id and the canonical name as its only alias.
    pub fn new(canonical_name: impl Into<String>, entity_type: EntityType, confidence: f64) -> Self {
        let canonical_name = canonical_name.into();
        let now = Utc::now();
        let mut aliases = BTreeSet::new();
        aliases.insert(canonical_name.clone());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            canonical_name,
            entity_type,
            aliases,
            confidence: Confidence::new(confidence),
            mentions: Vec::new(),
            embedding: None,
            attributes: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            merged_into: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        for mention in &mut self.mentions {
            mention.entity_id = id.clone();
        }
        self.id = id;
        self
    }

    pub fn with_mention(mut self, mut mention: Mention) -> Self {
        mention.entity_id = self.id.clone();
        self.mentions.push(mention);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.canonical_name)
    }

    /// Normalized forms of every alias (canonical name included).
    pub fn normalized_aliases(&self) -> BTreeSet<String> {
        self.aliases.iter().map(|a| normalize_name(a)).collect()
    }

    pub fn mention_count(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_active(&self) -> bool {
        self.merged_into.is_none()
    }

    /// Distinct chunk ids this entity is mentioned in.
    pub fn chunk_ids(&self) -> BTreeSet<String> {
        self.mentions.iter().map(|m| m.chunk_id.clone()).collect()
    }

    /// Re-establish the alias invariant after a deserialization or manual edit.
    pub fn ensure_canonical_alias(&mut self) {
        if !self.aliases.contains(&self.canonical_name) {
            self.aliases.insert(self.canonical_name.clone());
        }
    }
}

/// Filter for `get_entities`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFilter {
    pub entity_types: Vec<EntityType>,
    pub min_confidence: Option<f64>,
    /// Case-insensitive substring match against canonical name and aliases.
    pub name_contains: Option<String>,
    pub chunk_id: Option<String>,
    /// Include merged-away tombstones.
    pub include_merged: bool,
    pub limit: Option<usize>,
}

impl EntityFilter {
    pub fn matches(&self, entity: &Entity) -> bool {
        if !self.include_merged && !entity.is_active() {
            return false;
        }
        if !self.entity_types.is_empty() && !self.entity_types.contains(&entity.entity_type) {
            return false;
        }
        if let Some(min) = self.min_confidence {
            if entity.confidence.value() < min {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            let needle = needle.to_lowercase();
            if !entity
                .aliases
                .iter()
                .any(|a| a.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        if let Some(chunk_id) = &self.chunk_id {
            if !entity.mentions.iter().any(|m| &m.chunk_id == chunk_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionMethod;

    #[test]
    fn new_entity_has_canonical_alias() {
        let e = Entity::new("Acme Corp", EntityType::Organization, 0.9);
        assert!(e.aliases.contains("Acme Corp"));
        assert!(e.is_active());
    }

    #[test]
    fn with_id_rewrites_mentions() {
        let e = Entity::new("Alice", EntityType::Person, 0.9)
            .with_mention(Mention::new("c1", 0, 5, ExtractionMethod::Pattern, 0.9))
            .with_id("fixed");
        assert_eq!(e.mentions[0].entity_id, "fixed");
    }

    #[test]
    fn filter_by_type_and_name() {
        let e = Entity::new("Acme Corp", EntityType::Organization, 0.9);
        let filter = EntityFilter {
            entity_types: vec![EntityType::Organization],
            name_contains: Some("acme".into()),
            ..Default::default()
        };
        assert!(filter.matches(&e));
        let other = EntityFilter {
            entity_types: vec![EntityType::Person],
            ..Default::default()
        };
        assert!(!other.matches(&e));
    }

    #[test]
    fn entity_type_round_trips_through_name() {
        for t in EntityType::ALL {
            assert_eq!(EntityType::from_str_name(t.as_str()), Some(t));
        }
    }
}

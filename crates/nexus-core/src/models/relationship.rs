use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;

/// Typed edges between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    WorksAt,
    LocatedIn,
    PartOf,
    Founded,
    Manages,
    Created,
    Uses,
    Mentions,
    RelatedTo,
    Other,
}

impl RelationshipType {
    pub const COUNT: usize = 10;

    pub const ALL: [RelationshipType; 10] = [
        Self::WorksAt,
        Self::LocatedIn,
        Self::PartOf,
        Self::Founded,
        Self::Manages,
        Self::Created,
        Self::Uses,
        Self::Mentions,
        Self::RelatedTo,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorksAt => "works_at",
            Self::LocatedIn => "located_in",
            Self::PartOf => "part_of",
            Self::Founded => "founded",
            Self::Manages => "manages",
            Self::Created => "created",
            Self::Uses => "uses",
            Self::Mentions => "mentions",
            Self::RelatedTo => "related_to",
            Self::Other => "other",
        }
    }

    pub fn from_str_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Default directionality for newly extracted relationships of this type.
    pub fn directed(self) -> bool {
        !matches!(self, Self::RelatedTo | Self::Other)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, directed or undirected edge between two entities.
///
/// Endpoints are entity ids into the graph arena, never direct references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    pub confidence: Confidence,
    /// Chunk ids supporting this relationship.
    pub evidence: Vec<String>,
    pub directed: bool,
    /// Number of times this relationship has been observed.
    #[serde(default = "default_occurrences")]
    pub occurrences: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_occurrences() -> u32 {
    1
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: RelationshipType,
        confidence: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type,
            confidence: Confidence::new(confidence),
            evidence: Vec::new(),
            directed: relationship_type.directed(),
            occurrences: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_evidence(mut self, chunk_id: impl Into<String>) -> Self {
        let chunk_id = chunk_id.into();
        if !self.evidence.contains(&chunk_id) {
            self.evidence.push(chunk_id);
        }
        self
    }

    pub fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Identity used for idempotent upserts. Undirected edges use the
    /// sorted endpoint pair so (a, b) and (b, a) collapse.
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey::new(
            &self.source_id,
            &self.target_id,
            self.relationship_type,
            self.directed,
        )
    }

    /// The endpoint opposite `entity_id`, if `entity_id` is an endpoint.
    pub fn other_endpoint(&self, entity_id: &str) -> Option<&str> {
        if self.source_id == entity_id {
            Some(&self.target_id)
        } else if self.target_id == entity_id {
            Some(&self.source_id)
        } else {
            None
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// Idempotence key for relationships.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipKey {
    pub a: String,
    pub b: String,
    pub relationship_type: RelationshipType,
    pub directed: bool,
}

impl RelationshipKey {
    pub fn new(source: &str, target: &str, relationship_type: RelationshipType, directed: bool) -> Self {
        let (a, b) = if directed || source <= target {
            (source.to_string(), target.to_string())
        } else {
            (target.to_string(), source.to_string())
        };
        Self {
            a,
            b,
            relationship_type,
            directed,
        }
    }
}

/// Filter for `get_relationships`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipFilter {
    /// Relationships where this entity is either endpoint.
    pub entity_id: Option<String>,
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub relationship_types: Vec<RelationshipType>,
    pub min_confidence: Option<f64>,
    pub limit: Option<usize>,
}

impl RelationshipFilter {
    pub fn matches(&self, rel: &Relationship) -> bool {
        if let Some(id) = &self.entity_id {
            if &rel.source_id != id && &rel.target_id != id {
                return false;
            }
        }
        if let Some(id) = &self.source_id {
            if &rel.source_id != id {
                return false;
            }
        }
        if let Some(id) = &self.target_id {
            if &rel.target_id != id {
                return false;
            }
        }
        if !self.relationship_types.is_empty()
            && !self.relationship_types.contains(&rel.relationship_type)
        {
            return false;
        }
        if let Some(min) = self.min_confidence {
            if rel.confidence.value() < min {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undirected_key_is_order_independent() {
        let ab = Relationship::new("a", "b", RelationshipType::RelatedTo, 0.5);
        let ba = Relationship::new("b", "a", RelationshipType::RelatedTo, 0.5);
        assert_eq!(ab.key(), ba.key());
    }

    #[test]
    fn directed_key_keeps_order() {
        let ab = Relationship::new("a", "b", RelationshipType::WorksAt, 0.5);
        let ba = Relationship::new("b", "a", RelationshipType::WorksAt, 0.5);
        assert_ne!(ab.key(), ba.key());
    }

    #[test]
    fn evidence_is_deduplicated() {
        let r = Relationship::new("a", "b", RelationshipType::Uses, 0.5)
            .with_evidence("c1")
            .with_evidence("c1");
        assert_eq!(r.evidence, vec!["c1".to_string()]);
    }

    #[test]
    fn other_endpoint() {
        let r = Relationship::new("a", "b", RelationshipType::Uses, 0.5);
        assert_eq!(r.other_endpoint("a"), Some("b"));
        assert_eq!(r.other_endpoint("b"), Some("a"));
        assert_eq!(r.other_endpoint("c"), None);
    }
}

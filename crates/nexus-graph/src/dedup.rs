//! Entity similarity scoring, similar-node search, and dedup candidates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use nexus_core::errors::{GraphError, NexusResult};
use nexus_core::models::{Entity, EntityType};
use nexus_core::similarity::cosine_similarity;
use nexus_core::text::name_similarity;

use crate::merge::MergeReport;
use crate::store::GraphStore;

/// A pair flagged as a probable duplicate but not merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupCandidate {
    /// The newer entity.
    pub entity_id: String,
    /// The existing entity it resembles.
    pub similar_to: String,
    pub similarity: f64,
    pub detected_at: DateTime<Utc>,
}

/// One result of `find_similar_nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarNode {
    pub entity_id: String,
    pub name: String,
    pub entity_type: EntityType,
    pub similarity: f64,
}

/// Two types may describe the same entity when equal, or when either is a
/// generic catch-all.
pub(crate) fn types_compatible(a: EntityType, b: EntityType) -> bool {
    a == b || a.is_generic() || b.is_generic()
}

/// Lexical similarity over alias sets. Sharing a normalized alias scores 1.
pub(crate) fn alias_similarity(a: &Entity, b: &Entity) -> f64 {
    let na = a.normalized_aliases();
    let nb = b.normalized_aliases();
    if !na.is_disjoint(&nb) {
        return 1.0;
    }
    let mut best = 0.0f64;
    for x in &a.aliases {
        for y in &b.aliases {
            best = best.max(name_similarity(x, y));
        }
    }
    best
}

impl GraphStore {
    /// Similarity of two entities in [0, 1]: the stronger of alias
    /// similarity and embedding cosine (when enabled and both sides carry
    /// an embedding).
    pub fn entity_similarity(&self, a: &Entity, b: &Entity) -> f64 {
        let lexical = alias_similarity(a, b);
        let semantic = match (&a.embedding, &b.embedding) {
            (Some(ea), Some(eb)) if self.config.use_embeddings => {
                cosine_similarity(ea, eb).max(0.0)
            }
            _ => 0.0,
        };
        lexical.max(semantic)
    }

    /// The most similar active, type-compatible entity to `probe`, other
    /// than `probe` itself. Ties go to the lexicographically smallest id.
    pub(crate) fn best_match(&self, probe: &Entity) -> Option<(String, f64)> {
        let mut best: Option<(String, f64)> = None;
        for entry in self.entities.iter() {
            let other = entry.value();
            if other.id == probe.id
                || !other.is_active()
                || !types_compatible(other.entity_type, probe.entity_type)
            {
                continue;
            }
            let score = self.entity_similarity(probe, other);
            let better = match &best {
                None => true,
                Some((id, s)) => score > *s || (score == *s && other.id < *id),
            };
            if better {
                best = Some((other.id.clone(), score));
            }
        }
        best
    }

    /// Active, type-compatible entities whose similarity to `entity_id` is
    /// at least `threshold`, best first. Merged-away entities never appear.
    pub fn find_similar_nodes(&self, entity_id: &str, threshold: f64) -> NexusResult<Vec<SimilarNode>> {
        let id = self.require_active(entity_id)?;
        let probe = self
            .get_entity(&id)
            .ok_or_else(|| GraphError::EntityNotFound { id: id.clone() })?;

        let mut out: Vec<SimilarNode> = self
            .entities
            .iter()
            .filter(|e| {
                e.id != probe.id
                    && e.is_active()
                    && types_compatible(e.entity_type, probe.entity_type)
            })
            .filter_map(|e| {
                let similarity = self.entity_similarity(&probe, e.value());
                (similarity >= threshold).then(|| SimilarNode {
                    entity_id: e.id.clone(),
                    name: e.canonical_name.clone(),
                    entity_type: e.entity_type,
                    similarity,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        Ok(out)
    }

    pub(crate) fn flag_candidate(&self, entity_id: &str, similar_to: &str, similarity: f64) {
        debug!(entity_id, similar_to, similarity, "dedup candidate flagged");
        self.candidates.insert(
            entity_id.to_string(),
            DedupCandidate {
                entity_id: entity_id.to_string(),
                similar_to: similar_to.to_string(),
                similarity,
                detected_at: Utc::now(),
            },
        );
    }

    /// Pending dedup candidates, most similar first.
    pub fn dedup_candidates(&self) -> Vec<DedupCandidate> {
        let mut out: Vec<DedupCandidate> = self.candidates.iter().map(|c| c.clone()).collect();
        out.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        out
    }

    /// Settle a pending candidate. Accepting merges the candidate into the
    /// entity it resembles; rejecting just clears the flag.
    pub fn resolve_candidate(&self, entity_id: &str, accept: bool) -> NexusResult<Option<MergeReport>> {
        let Some((_, candidate)) = self.candidates.remove(entity_id) else {
            return Err(GraphError::EntityNotFound {
                id: entity_id.to_string(),
            }
            .into());
        };
        if !accept {
            return Ok(None);
        }
        let report = self.merge_entities(&candidate.similar_to, &[candidate.entity_id])?;
        Ok(Some(report))
    }

    /// Drop candidates that no longer name two distinct active entities.
    pub(crate) fn prune_candidates(&self) {
        self.candidates.retain(|_, c| {
            match (self.resolve_id(&c.entity_id), self.resolve_id(&c.similar_to)) {
                (Some(a), Some(b)) => a != b && a == c.entity_id,
                _ => false,
            }
        });
    }
}

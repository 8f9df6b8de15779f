//! Entity and relationship upserts.
//!
//! Entity upserts serialize on the normalized canonical name, then on the
//! entity being touched. Relationship upserts lock both endpoints. Observers
//! and provenance are notified only after every guard is released.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use nexus_core::errors::{GraphError, NexusResult};
use nexus_core::models::provenance::components;
use nexus_core::models::{
    Confidence, DerivationKind, Entity, ProvenanceRecord, Relationship, RelationshipKey,
};

use crate::dedup::types_compatible;
use crate::store::GraphStore;

/// What an upsert did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    /// Folded into an existing entity or relationship with the same identity.
    Updated,
    /// Folded into a different, similar entity by auto-merge.
    Merged { into: String },
    /// Nothing stored (a relationship whose endpoints resolve to one entity).
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    /// Id of the stored entity or relationship carrying the data.
    pub id: String,
    pub action: UpsertAction,
    /// Best dedup similarity seen, for entity upserts that scored one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

struct Committed {
    outcome: UpsertOutcome,
    affected: Vec<String>,
    record: Option<ProvenanceRecord>,
}

impl GraphStore {
    /// Insert `entity`, or fold it into the existing entity it duplicates.
    ///
    /// An exact normalized name or alias match of a compatible type updates
    /// that entity in place. Otherwise a similarity at or above the dedup
    /// threshold merges it when auto-merge is on; a similarity at or above
    /// the candidate threshold creates it and flags the pair.
    pub fn upsert_entity(&self, mut entity: Entity) -> NexusResult<UpsertOutcome> {
        if entity.normalized_name().is_empty() {
            return Err(GraphError::InvalidEntity {
                reason: format!("entity {} has an empty name", entity.id),
            }
            .into());
        }
        entity.ensure_canonical_alias();
        entity.confidence = Confidence::new(entity.confidence.value());
        let id = entity.id.clone();
        for mention in &mut entity.mentions {
            mention.entity_id = id.clone();
        }
        self.ensure_embedding(&mut entity);

        let attempts = self.config.merge_retry_limit.max(1);
        for _ in 0..attempts {
            if let Some(committed) = self.try_upsert_entity(&entity)? {
                return Ok(self.publish(committed));
            }
        }
        Err(GraphError::MergeConflict {
            entity_id: entity.id,
            attempts,
        }
        .into())
    }

    fn ensure_embedding(&self, entity: &mut Entity) {
        if entity.embedding.is_some() || !self.config.use_embeddings {
            return;
        }
        let Some(embedder) = &self.embedder else {
            return;
        };
        match embedder.embed(&entity.canonical_name) {
            Ok(vector) => entity.embedding = Some(vector),
            Err(e) => warn!(
                entity = %entity.canonical_name,
                error = %e,
                "entity embedding failed, dedup falls back to names"
            ),
        }
    }

    /// One attempt. `None` means a concurrent merge retired the target and
    /// the caller should retry.
    fn try_upsert_entity(&self, entity: &Entity) -> NexusResult<Option<Committed>> {
        let _name_guard = self.name_locks.lock_one(&entity.normalized_name());

        if let Some(target) = self.exact_match(entity) {
            return Ok(self
                .absorb(&target, entity)
                .map(|record| Committed {
                    outcome: UpsertOutcome {
                        id: target.clone(),
                        action: UpsertAction::Updated,
                        similarity: None,
                    },
                    affected: vec![target],
                    record: Some(record),
                }));
        }

        let best = self.best_match(entity);
        if let Some((target, score)) = &best {
            if *score >= self.config.dedup_threshold && self.config.auto_merge {
                return Ok(self.absorb(target, entity).map(|record| {
                    debug!(into = %target, similarity = score, "entity auto-merged on upsert");
                    Committed {
                        outcome: UpsertOutcome {
                            id: target.clone(),
                            action: UpsertAction::Merged {
                                into: target.clone(),
                            },
                            similarity: Some(*score),
                        },
                        affected: vec![target.clone()],
                        record: Some(
                            record_with_kind(record, DerivationKind::EntityMerged)
                                .with_detail("similarity", format!("{score:.3}")),
                        ),
                    }
                }));
            }
        }

        let stored = {
            let _guard = self.entity_locks.lock_one(&entity.id);
            let stored = entity.clone();
            self.entities.insert(stored.id.clone(), stored.clone());
            self.index_entity(&stored);
            stored
        };
        if let Some((target, score)) = &best {
            if *score >= self.config.candidate_threshold {
                self.flag_candidate(&stored.id, target, *score);
            }
        }
        let record = ProvenanceRecord::new(
            &stored.id,
            DerivationKind::EntityCreated,
            stored.chunk_ids().into_iter().collect(),
            components::GRAPH,
        );
        Ok(Some(Committed {
            outcome: UpsertOutcome {
                id: stored.id.clone(),
                action: UpsertAction::Created,
                similarity: best.map(|(_, s)| s),
            },
            affected: vec![stored.id],
            record: Some(record),
        }))
    }

    /// An active entity sharing this id or a normalized alias with
    /// `entity`. Same-type matches win over generic ones.
    fn exact_match(&self, entity: &Entity) -> Option<String> {
        if self.entities.contains_key(&entity.id) {
            return self.resolve_id(&entity.id);
        }
        let mut found: Vec<(bool, String)> = Vec::new();
        for alias in entity.normalized_aliases() {
            let ids = match self.name_index.get(&alias) {
                Some(ids) => ids.clone(),
                None => continue,
            };
            for id in ids {
                let Some(existing) = self.get_active_entity(&id) else {
                    continue;
                };
                if types_compatible(existing.entity_type, entity.entity_type) {
                    found.push((existing.entity_type != entity.entity_type, existing.id));
                }
            }
        }
        found.sort();
        found.into_iter().next().map(|(_, id)| id)
    }

    /// Fold `incoming` into the active entity `target_id` under its lock.
    /// `None` if the target was merged away before the lock was taken.
    fn absorb(&self, target_id: &str, incoming: &Entity) -> Option<ProvenanceRecord> {
        let _guard = self.entity_locks.lock_one(target_id);
        let mut current = self.get_entity(target_id)?;
        if !current.is_active() {
            return None;
        }

        let before_type = current.entity_type;
        current.confidence = Confidence::weighted_average(&[
            (current.confidence, current.mention_count().max(1) as f64),
            (incoming.confidence, incoming.mention_count().max(1) as f64),
        ]);
        for mention in &incoming.mentions {
            let mut mention = mention.clone();
            mention.entity_id = current.id.clone();
            current.mentions.push(mention);
        }
        current.aliases.extend(incoming.aliases.iter().cloned());
        if current.entity_type.is_generic() && !incoming.entity_type.is_generic() {
            current.entity_type = incoming.entity_type;
        }
        if current.embedding.is_none() {
            current.embedding = incoming.embedding.clone();
        }
        for (k, v) in &incoming.attributes {
            current.attributes.entry(k.clone()).or_insert_with(|| v.clone());
        }
        current.created_at = current.created_at.min(incoming.created_at);
        current.updated_at = Utc::now();

        self.entities.insert(current.id.clone(), current.clone());
        if before_type != current.entity_type {
            self.retype(&current.id, before_type, current.entity_type);
        }
        self.index_entity(&current);

        Some(ProvenanceRecord::new(
            &current.id,
            DerivationKind::EntityUpdated,
            incoming.chunk_ids().into_iter().collect(),
            components::GRAPH,
        ))
    }

    /// Insert `rel`, or bump the existing relationship with the same
    /// endpoints and type. Endpoints are resolved through merge redirects
    /// and must name active entities.
    pub fn upsert_relationship(&self, mut rel: Relationship) -> NexusResult<UpsertOutcome> {
        rel.confidence = Confidence::new(rel.confidence.value());
        let attempts = self.config.merge_retry_limit.max(1);
        for _ in 0..attempts {
            let source = self.resolve_endpoint(&rel.source_id)?;
            let target = self.resolve_endpoint(&rel.target_id)?;
            if source == target {
                debug!(entity = %source, kind = %rel.relationship_type, "self-loop relationship skipped");
                return Ok(UpsertOutcome {
                    id: rel.id,
                    action: UpsertAction::Skipped,
                    similarity: None,
                });
            }
            if let Some(committed) = self.try_upsert_relationship(&rel, &source, &target) {
                return Ok(self.publish(committed));
            }
        }
        Err(GraphError::MergeConflict {
            entity_id: rel.source_id,
            attempts,
        }
        .into())
    }

    fn resolve_endpoint(&self, id: &str) -> NexusResult<String> {
        self.resolve_id(id).ok_or_else(|| {
            GraphError::DanglingEndpoint {
                entity_id: id.to_string(),
            }
            .into()
        })
    }

    fn try_upsert_relationship(
        &self,
        rel: &Relationship,
        source: &str,
        target: &str,
    ) -> Option<Committed> {
        let _guards = self.entity_locks.lock_many([source, target]);
        if !self.is_active(source) || !self.is_active(target) {
            return None;
        }

        let key = RelationshipKey::new(source, target, rel.relationship_type, rel.directed);
        let existing = self
            .rel_index
            .get(&key)
            .map(|id| id.clone())
            .and_then(|id| self.get_relationship(&id));

        let (stored, kind, action) = match existing {
            Some(mut current) => {
                current.occurrences = current.occurrences.saturating_add(1);
                for chunk_id in &rel.evidence {
                    if !current.evidence.contains(chunk_id) {
                        current.evidence.push(chunk_id.clone());
                    }
                }
                if rel.confidence > current.confidence {
                    current.confidence = rel.confidence;
                }
                current.updated_at = Utc::now();
                (current, DerivationKind::RelationshipUpdated, UpsertAction::Updated)
            }
            None => {
                let mut fresh = rel.clone();
                fresh.source_id = source.to_string();
                fresh.target_id = target.to_string();
                self.rel_index.insert(key, fresh.id.clone());
                for endpoint in [source, target] {
                    self.adjacency
                        .entry(endpoint.to_string())
                        .or_default()
                        .insert(fresh.id.clone());
                }
                (fresh, DerivationKind::RelationshipCreated, UpsertAction::Created)
            }
        };
        self.relationships.insert(stored.id.clone(), stored.clone());

        let record = ProvenanceRecord::new(
            &stored.id,
            kind,
            vec![source.to_string(), target.to_string()]
                .into_iter()
                .chain(rel.evidence.iter().cloned())
                .collect(),
            components::GRAPH,
        )
        .with_detail("relationship_type", stored.relationship_type.as_str());
        Some(Committed {
            outcome: UpsertOutcome {
                id: stored.id.clone(),
                action,
                similarity: None,
            },
            affected: vec![stored.id, source.to_string(), target.to_string()],
            record: Some(record),
        })
    }

    /// Overwrite the confidence of an entity or relationship.
    pub fn update_confidence(&self, id: &str, confidence: f64) -> NexusResult<()> {
        let confidence = Confidence::new(confidence);
        if let Some(entity_id) = self.resolve_id(id) {
            {
                let _guard = self.entity_locks.lock_one(&entity_id);
                let Some(mut entity) = self.get_entity(&entity_id) else {
                    return Err(GraphError::EntityNotFound { id: entity_id }.into());
                };
                entity.confidence = confidence;
                entity.updated_at = Utc::now();
                self.entities.insert(entity_id.clone(), entity);
            }
            self.publish(Committed {
                outcome: UpsertOutcome {
                    id: entity_id.clone(),
                    action: UpsertAction::Updated,
                    similarity: None,
                },
                affected: vec![entity_id.clone()],
                record: Some(
                    ProvenanceRecord::new(
                        &entity_id,
                        DerivationKind::EntityUpdated,
                        Vec::new(),
                        components::GRAPH,
                    )
                    .with_detail("confidence", confidence.to_string()),
                ),
            });
            return Ok(());
        }

        let Some(rel) = self.get_relationship(id) else {
            return Err(GraphError::RelationshipNotFound { id: id.to_string() }.into());
        };
        {
            let _guards = self
                .entity_locks
                .lock_many([rel.source_id.as_str(), rel.target_id.as_str()]);
            if let Some(mut current) = self.get_relationship(id) {
                current.confidence = confidence;
                current.updated_at = Utc::now();
                self.relationships.insert(id.to_string(), current);
            }
        }
        self.publish(Committed {
            outcome: UpsertOutcome {
                id: id.to_string(),
                action: UpsertAction::Updated,
                similarity: None,
            },
            affected: vec![id.to_string()],
            record: Some(
                ProvenanceRecord::new(
                    id,
                    DerivationKind::RelationshipUpdated,
                    Vec::new(),
                    components::GRAPH,
                )
                .with_detail("confidence", confidence.to_string()),
            ),
        });
        Ok(())
    }

    fn publish(&self, committed: Committed) -> UpsertOutcome {
        self.notify(&committed.affected);
        if let Some(record) = committed.record {
            self.record(record);
        }
        committed.outcome
    }
}

fn record_with_kind(mut record: ProvenanceRecord, kind: DerivationKind) -> ProvenanceRecord {
    record.kind = kind;
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::config::GraphConfig;
    use nexus_core::models::{EntityType, ExtractionMethod, Mention, RelationshipType};

    fn alice(chunk: &str) -> Entity {
        Entity::new("Alice", EntityType::Person, 0.8)
            .with_mention(Mention::new(chunk, 0, 5, ExtractionMethod::Pattern, 0.8))
    }

    #[test]
    fn same_name_updates_in_place() {
        let store = GraphStore::new(GraphConfig::default());
        let first = store.upsert_entity(alice("c1")).unwrap();
        let second = store.upsert_entity(alice("c2")).unwrap();
        assert_eq!(first.action, UpsertAction::Created);
        assert_eq!(second.action, UpsertAction::Updated);
        assert_eq!(first.id, second.id);
        let stored = store.get_entity(&first.id).unwrap();
        assert_eq!(stored.mention_count(), 2);
        assert!(stored.mentions.iter().all(|m| m.entity_id == first.id));
    }

    #[test]
    fn empty_name_is_rejected() {
        let store = GraphStore::new(GraphConfig::default());
        let err = store
            .upsert_entity(Entity::new("  ", EntityType::Person, 0.5))
            .unwrap_err();
        assert!(matches!(
            err,
            nexus_core::NexusError::GraphError(GraphError::InvalidEntity { .. })
        ));
    }

    #[test]
    fn generic_type_is_upgraded_by_specific_observation() {
        let store = GraphStore::new(GraphConfig::default());
        let id = store
            .upsert_entity(Entity::new("Nimbus Labs", EntityType::Concept, 0.5))
            .unwrap()
            .id;
        store
            .upsert_entity(Entity::new("Nimbus Labs", EntityType::Organization, 0.8))
            .unwrap();
        assert_eq!(store.get_entity(&id).unwrap().entity_type, EntityType::Organization);
    }

    #[test]
    fn different_specific_types_stay_apart() {
        let store = GraphStore::new(GraphConfig::default());
        let a = store
            .upsert_entity(Entity::new("Jordan", EntityType::Person, 0.8))
            .unwrap();
        let b = store
            .upsert_entity(Entity::new("Jordan", EntityType::Location, 0.8))
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn relationship_upsert_is_idempotent() {
        let store = GraphStore::new(GraphConfig::default());
        let a = store.upsert_entity(alice("c1")).unwrap().id;
        let b = store
            .upsert_entity(Entity::new("Acme Corp", EntityType::Organization, 0.9))
            .unwrap()
            .id;
        let first = store
            .upsert_relationship(
                Relationship::new(&a, &b, RelationshipType::WorksAt, 0.7).with_evidence("c1"),
            )
            .unwrap();
        let second = store
            .upsert_relationship(
                Relationship::new(&a, &b, RelationshipType::WorksAt, 0.9).with_evidence("c2"),
            )
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.action, UpsertAction::Updated);
        let rel = store.get_relationship(&first.id).unwrap();
        assert_eq!(rel.occurrences, 2);
        assert_eq!(rel.evidence, vec!["c1".to_string(), "c2".to_string()]);
        assert!((rel.confidence.value() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn relationship_to_unknown_entity_is_dangling() {
        let store = GraphStore::new(GraphConfig::default());
        let a = store.upsert_entity(alice("c1")).unwrap().id;
        let err = store
            .upsert_relationship(Relationship::new(&a, "missing", RelationshipType::Uses, 0.5))
            .unwrap_err();
        assert!(matches!(
            err,
            nexus_core::NexusError::GraphError(GraphError::DanglingEndpoint { .. })
        ));
    }

    #[test]
    fn self_loop_is_skipped() {
        let store = GraphStore::new(GraphConfig::default());
        let a = store.upsert_entity(alice("c1")).unwrap().id;
        let outcome = store
            .upsert_relationship(Relationship::new(&a, &a, RelationshipType::RelatedTo, 0.5))
            .unwrap();
        assert_eq!(outcome.action, UpsertAction::Skipped);
        assert_eq!(store.relationship_count(), 0);
    }

    #[test]
    fn update_confidence_clamps() {
        let store = GraphStore::new(GraphConfig::default());
        let a = store.upsert_entity(alice("c1")).unwrap().id;
        store.update_confidence(&a, 1.4).unwrap();
        assert_eq!(store.get_entity(&a).unwrap().confidence.value(), 1.0);
        assert!(store.update_confidence("nope", 0.5).is_err());
    }
}

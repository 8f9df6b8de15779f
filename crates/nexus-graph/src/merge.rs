//! Transactional entity merge.
//!
//! The primary and every duplicate are locked together (sorted stripes).
//! Mentions and relationships move to the primary, parallel relationships
//! produced by rewiring collapse into one, and each duplicate is left
//! behind as a tombstone redirecting to the primary.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use nexus_core::errors::{GraphError, NexusResult};
use nexus_core::merge_span;
use nexus_core::models::provenance::components;
use nexus_core::models::{Confidence, DerivationKind, ProvenanceRecord};

use crate::store::GraphStore;

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub primary_id: String,
    /// Duplicates folded into the primary by this call.
    pub merged_ids: Vec<String>,
    /// Requested duplicates that already resolved to the primary.
    pub already_merged: Vec<String>,
    pub mentions_moved: usize,
    pub relationships_rewired: usize,
    /// Rewired relationships folded into an existing parallel one.
    pub relationships_collapsed: usize,
    /// Relationships between the primary and a duplicate, dropped.
    pub self_loops_dropped: usize,
    /// Primary confidence after the merge.
    pub confidence: f64,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.merged_ids.is_empty()
    }
}

impl GraphStore {
    /// Merge `duplicate_ids` into `primary_id`.
    ///
    /// Ids are resolved through redirects first, so merging an already
    /// merged duplicate again is a no-op. Fails with `EntityNotFound` for
    /// unknown ids and `MergeConflict` when concurrent merges keep retiring
    /// the participants.
    pub fn merge_entities(&self, primary_id: &str, duplicate_ids: &[String]) -> NexusResult<MergeReport> {
        let span = merge_span!(primary_id, duplicate_ids.len());
        let _entered = span.enter();

        let attempts = self.config.merge_retry_limit.max(1);
        for _ in 0..attempts {
            let primary = self.require_active(primary_id)?;
            let mut duplicates: Vec<String> = Vec::new();
            let mut already_merged = Vec::new();
            for requested in duplicate_ids {
                let resolved = self.require_active(requested)?;
                if resolved == primary {
                    already_merged.push(requested.clone());
                } else if !duplicates.contains(&resolved) {
                    duplicates.push(resolved);
                }
            }

            if duplicates.is_empty() {
                let confidence = self
                    .get_entity(&primary)
                    .map(|e| e.confidence.value())
                    .unwrap_or_default();
                return Ok(MergeReport {
                    primary_id: primary,
                    already_merged,
                    confidence,
                    ..Default::default()
                });
            }

            if let Some((mut report, affected)) = self.try_merge(&primary, &duplicates) {
                report.already_merged = already_merged;
                self.prune_candidates();
                self.notify(&affected);
                self.record(
                    ProvenanceRecord::new(
                        &report.primary_id,
                        DerivationKind::EntityMerged,
                        report.merged_ids.clone(),
                        components::GRAPH,
                    )
                    .with_detail("mentions_moved", report.mentions_moved.to_string())
                    .with_detail(
                        "relationships_rewired",
                        report.relationships_rewired.to_string(),
                    ),
                );
                for merged in &report.merged_ids {
                    self.record(
                        ProvenanceRecord::new(
                            merged,
                            DerivationKind::EntityMerged,
                            vec![report.primary_id.clone()],
                            components::GRAPH,
                        )
                        .with_detail("merged_into", report.primary_id.clone()),
                    );
                }
                info!(
                    primary = %report.primary_id,
                    merged = report.merged_ids.len(),
                    mentions_moved = report.mentions_moved,
                    rewired = report.relationships_rewired,
                    collapsed = report.relationships_collapsed,
                    self_loops = report.self_loops_dropped,
                    "entities merged"
                );
                return Ok(report);
            }
        }
        Err(GraphError::MergeConflict {
            entity_id: primary_id.to_string(),
            attempts,
        }
        .into())
    }

    /// One merge attempt under the participants' locks. `None` if any
    /// participant was retired before the locks were taken.
    fn try_merge(&self, primary_id: &str, duplicates: &[String]) -> Option<(MergeReport, Vec<String>)> {
        let _guards = self.entity_locks.lock_many(
            std::iter::once(primary_id).chain(duplicates.iter().map(String::as_str)),
        );

        let mut primary = self.get_entity(primary_id).filter(|e| e.is_active())?;
        let mut dups = Vec::with_capacity(duplicates.len());
        for id in duplicates {
            dups.push(self.get_entity(id).filter(|e| e.is_active())?);
        }

        let mut weights = vec![(primary.confidence, primary.mention_count().max(1) as f64)];
        weights.extend(
            dups.iter()
                .map(|d| (d.confidence, d.mention_count().max(1) as f64)),
        );

        let mut report = MergeReport {
            primary_id: primary_id.to_string(),
            ..Default::default()
        };
        let mut affected: Vec<String> = vec![primary_id.to_string()];
        let before_type = primary.entity_type;

        for mut dup in dups {
            self.unindex_entity(&dup);

            for mut mention in dup.mentions.drain(..) {
                mention.entity_id = primary.id.clone();
                primary.mentions.push(mention);
                report.mentions_moved += 1;
            }
            primary.aliases.extend(dup.aliases.iter().cloned());
            primary.created_at = primary.created_at.min(dup.created_at);
            if primary.entity_type.is_generic() && !dup.entity_type.is_generic() {
                primary.entity_type = dup.entity_type;
            }
            if primary.embedding.is_none() {
                primary.embedding = dup.embedding.take();
            }
            for (k, v) in std::mem::take(&mut dup.attributes) {
                primary.attributes.entry(k).or_insert(v);
            }

            self.rewire(&dup.id, primary_id, &mut report, &mut affected);

            dup.merged_into = Some(primary.id.clone());
            dup.updated_at = Utc::now();
            affected.push(dup.id.clone());
            report.merged_ids.push(dup.id.clone());
            self.entities.insert(dup.id.clone(), dup);
        }

        primary.confidence = Confidence::weighted_average(&weights);
        primary.updated_at = Utc::now();
        report.confidence = primary.confidence.value();
        if before_type != primary.entity_type {
            self.retype(&primary.id, before_type, primary.entity_type);
        }
        self.index_entity(&primary);
        self.entities.insert(primary.id.clone(), primary);

        Some((report, affected))
    }

    /// Re-point every relationship touching `dup` at `primary`.
    fn rewire(&self, dup: &str, primary: &str, report: &mut MergeReport, affected: &mut Vec<String>) {
        for rel_id in self.relationship_ids_of(dup) {
            let Some(mut rel) = self.get_relationship(&rel_id) else {
                continue;
            };
            let old_key = rel.key();
            self.rel_index.remove_if(&old_key, |_, id| id == &rel_id);
            if rel.source_id == dup {
                rel.source_id = primary.to_string();
            }
            if rel.target_id == dup {
                rel.target_id = primary.to_string();
            }
            affected.push(rel_id.clone());

            if rel.is_self_loop() {
                self.relationships.remove(&rel_id);
                self.detach(&rel_id, &[primary]);
                report.self_loops_dropped += 1;
                continue;
            }

            let key = rel.key();
            let parallel = self
                .rel_index
                .get(&key)
                .map(|id| id.clone())
                .filter(|id| id != &rel_id)
                .and_then(|id| self.get_relationship(&id));
            match parallel {
                Some(mut existing) => {
                    existing.occurrences = existing.occurrences.saturating_add(rel.occurrences);
                    for chunk_id in rel.evidence {
                        if !existing.evidence.contains(&chunk_id) {
                            existing.evidence.push(chunk_id);
                        }
                    }
                    if rel.confidence > existing.confidence {
                        existing.confidence = rel.confidence;
                    }
                    existing.updated_at = Utc::now();
                    affected.push(existing.id.clone());
                    self.relationships.insert(existing.id.clone(), existing);
                    self.relationships.remove(&rel_id);
                    self.detach(&rel_id, &[rel.source_id.as_str(), rel.target_id.as_str()]);
                    report.relationships_collapsed += 1;
                }
                None => {
                    rel.updated_at = Utc::now();
                    self.rel_index.insert(key, rel_id.clone());
                    self.adjacency
                        .entry(primary.to_string())
                        .or_default()
                        .insert(rel_id.clone());
                    self.relationships.insert(rel_id, rel);
                    report.relationships_rewired += 1;
                }
            }
        }
        self.adjacency.remove(dup);
    }

    fn detach(&self, rel_id: &str, endpoints: &[&str]) {
        for endpoint in endpoints {
            if let Some(mut ids) = self.adjacency.get_mut(*endpoint) {
                ids.remove(rel_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::config::GraphConfig;
    use nexus_core::models::{
        Entity, EntityType, ExtractionMethod, Mention, Relationship, RelationshipType,
    };

    fn store() -> GraphStore {
        GraphStore::new(GraphConfig {
            auto_merge: false,
            ..GraphConfig::default()
        })
    }

    fn org(store: &GraphStore, name: &str, chunk: &str, confidence: f64) -> String {
        store
            .upsert_entity(
                Entity::new(name, EntityType::Organization, confidence)
                    .with_mention(Mention::new(chunk, 0, 4, ExtractionMethod::Pattern, 0.9)),
            )
            .unwrap()
            .id
    }

    #[test]
    fn merge_moves_mentions_and_weights_confidence() {
        let store = store();
        let a = org(&store, "Acme Corp", "c1", 0.9);
        let b = org(&store, "Initech", "c2", 0.6);
        store
            .upsert_entity(
                Entity::new("Initech", EntityType::Organization, 0.6)
                    .with_mention(Mention::new("c3", 0, 4, ExtractionMethod::Pattern, 0.6)),
            )
            .unwrap();

        let report = store.merge_entities(&a, &[b.clone()]).unwrap();
        assert_eq!(report.merged_ids, vec![b.clone()]);
        assert_eq!(report.mentions_moved, 2);
        // (0.9 * 1 + 0.6 * 2) / 3
        assert!((report.confidence - 0.7).abs() < 1e-9);

        let primary = store.get_entity(&a).unwrap();
        assert_eq!(primary.mention_count(), 3);
        assert!(primary.aliases.contains("Initech"));
        assert!(primary.mentions.iter().all(|m| m.entity_id == a));
        let tomb = store.get_entity(&b).unwrap();
        assert_eq!(tomb.merged_into.as_deref(), Some(a.as_str()));
        assert!(tomb.mentions.is_empty());
        assert_eq!(store.resolve_id(&b), Some(a));
    }

    #[test]
    fn merge_drops_self_loops_and_collapses_parallels() {
        let store = store();
        let a = org(&store, "Acme Corp", "c1", 0.9);
        let b = org(&store, "Acme Holdings", "c2", 0.9);
        let c = org(&store, "Umbrella Group", "c3", 0.9);
        store
            .upsert_relationship(Relationship::new(&a, &b, RelationshipType::RelatedTo, 0.5))
            .unwrap();
        store
            .upsert_relationship(
                Relationship::new(&a, &c, RelationshipType::PartOf, 0.6).with_evidence("c1"),
            )
            .unwrap();
        store
            .upsert_relationship(
                Relationship::new(&b, &c, RelationshipType::PartOf, 0.8).with_evidence("c2"),
            )
            .unwrap();

        let report = store.merge_entities(&a, &[b]).unwrap();
        assert_eq!(report.self_loops_dropped, 1);
        assert_eq!(report.relationships_collapsed, 1);
        assert_eq!(store.relationship_count(), 1);

        let rels = store.get_relationships(&Default::default());
        assert_eq!(rels[0].source_id, a);
        assert_eq!(rels[0].occurrences, 2);
        assert!((rels[0].confidence.value() - 0.8).abs() < 1e-9);
        assert_eq!(rels[0].evidence.len(), 2);
    }

    #[test]
    fn remerge_is_noop() {
        let store = store();
        let a = org(&store, "Acme Corp", "c1", 0.9);
        let b = org(&store, "Initech", "c2", 0.9);
        store.merge_entities(&a, &[b.clone()]).unwrap();
        let again = store.merge_entities(&a, &[b.clone()]).unwrap();
        assert!(again.is_noop());
        assert_eq!(again.already_merged, vec![b]);
        assert_eq!(store.get_entity(&a).unwrap().mention_count(), 2);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = store();
        let a = org(&store, "Acme Corp", "c1", 0.9);
        let err = store.merge_entities(&a, &["ghost".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            nexus_core::NexusError::GraphError(GraphError::EntityNotFound { .. })
        ));
    }
}

//! Integrity scan. Violations are reported, never repaired.

use nexus_core::models::{ConsistencyReport, ConsistencyViolation, Entity, Relationship};

use crate::store::GraphStore;

impl GraphStore {
    pub fn validate_consistency(&self) -> ConsistencyReport {
        let mut entities: Vec<Entity> = self.entities.iter().map(|e| e.clone()).collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        let mut relationships: Vec<Relationship> =
            self.relationships.iter().map(|r| r.clone()).collect();
        relationships.sort_by(|a, b| a.id.cmp(&b.id));

        let mut violations = Vec::new();
        for entity in &entities {
            self.check_entity(entity, &mut violations);
        }
        for rel in &relationships {
            self.check_relationship(rel, &mut violations);
        }

        ConsistencyReport {
            entities_checked: entities.len(),
            relationships_checked: relationships.len(),
            violations,
        }
    }

    fn check_entity(&self, entity: &Entity, out: &mut Vec<ConsistencyViolation>) {
        if entity.aliases.is_empty() {
            out.push(ConsistencyViolation::EmptyAliasSet {
                entity_id: entity.id.clone(),
            });
        } else if !entity.aliases.contains(&entity.canonical_name) {
            out.push(ConsistencyViolation::CanonicalNameNotAliased {
                entity_id: entity.id.clone(),
            });
        }
        if !entity.confidence.in_range() {
            out.push(ConsistencyViolation::ConfidenceOutOfRange {
                subject_id: entity.id.clone(),
                value: entity.confidence.value(),
            });
        }
        if let Some(target) = &entity.merged_into {
            if !self.entities.contains_key(target) {
                out.push(ConsistencyViolation::BrokenRedirect {
                    entity_id: entity.id.clone(),
                    merged_into: target.clone(),
                });
            }
        }
        for mention in &entity.mentions {
            let reason = if !entity.is_active() {
                Some("mention left on merged-away entity")
            } else if mention.entity_id != entity.id {
                Some("mention owned by another entity id")
            } else {
                None
            };
            if let Some(reason) = reason {
                out.push(ConsistencyViolation::OrphanMention {
                    entity_id: entity.id.clone(),
                    chunk_id: mention.chunk_id.clone(),
                    reason: reason.to_string(),
                });
            }
            if !mention.confidence.in_range() {
                out.push(ConsistencyViolation::ConfidenceOutOfRange {
                    subject_id: entity.id.clone(),
                    value: mention.confidence.value(),
                });
            }
        }
    }

    fn check_relationship(&self, rel: &Relationship, out: &mut Vec<ConsistencyViolation>) {
        for endpoint in [&rel.source_id, &rel.target_id] {
            match self.entities.get(endpoint).map(|e| e.is_active()) {
                None => out.push(ConsistencyViolation::DanglingEdge {
                    relationship_id: rel.id.clone(),
                    missing_entity_id: endpoint.clone(),
                }),
                Some(false) => out.push(ConsistencyViolation::EdgeToMergedEntity {
                    relationship_id: rel.id.clone(),
                    merged_entity_id: endpoint.clone(),
                }),
                Some(true) => {}
            }
        }
        if rel.is_self_loop() {
            out.push(ConsistencyViolation::SelfLoop {
                relationship_id: rel.id.clone(),
            });
        }
        if !rel.confidence.in_range() {
            out.push(ConsistencyViolation::ConfidenceOutOfRange {
                subject_id: rel.id.clone(),
                value: rel.confidence.value(),
            });
        }
    }
}

//! Folds one chunk's extraction output into the graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use nexus_core::errors::NexusResult;
use nexus_core::models::{CandidateEntity, CandidateRelationship, Entity, ExtractionOutput, Mention, Relationship};
use nexus_graph::{GraphStore, UpsertAction};

/// Graph writes made for one chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyCounts {
    pub entities_created: usize,
    /// Exact matches and auto-merges into an existing entity.
    pub entities_updated: usize,
    pub relationships_created: usize,
    pub relationships_updated: usize,
}

impl ApplyCounts {
    pub fn add(&mut self, other: ApplyCounts) {
        self.entities_created += other.entities_created;
        self.entities_updated += other.entities_updated;
        self.relationships_created += other.relationships_created;
        self.relationships_updated += other.relationships_updated;
    }
}

/// Upsert every candidate entity, then every candidate relationship whose
/// endpoints were stored. Chunk-local keys resolve to the graph id the
/// entity landed on, which may be a pre-existing entity.
pub fn apply_extraction(graph: &GraphStore, output: &ExtractionOutput) -> NexusResult<ApplyCounts> {
    let mut counts = ApplyCounts::default();
    let mut ids: HashMap<&str, String> = HashMap::with_capacity(output.entities.len());

    for candidate in &output.entities {
        let outcome = graph.upsert_entity(to_entity(&output.chunk_id, candidate))?;
        match outcome.action {
            UpsertAction::Created => counts.entities_created += 1,
            UpsertAction::Updated | UpsertAction::Merged { .. } => counts.entities_updated += 1,
            UpsertAction::Skipped => {}
        }
        ids.insert(candidate.key.as_str(), outcome.id);
    }

    for candidate in &output.relationships {
        let (Some(source), Some(target)) = (
            ids.get(candidate.source_key.as_str()),
            ids.get(candidate.target_key.as_str()),
        ) else {
            debug!(
                chunk_id = %output.chunk_id,
                source = %candidate.source_key,
                target = %candidate.target_key,
                "relationship endpoint not extracted, skipped"
            );
            continue;
        };
        let outcome = graph.upsert_relationship(to_relationship(&output.chunk_id, source, target, candidate))?;
        match outcome.action {
            UpsertAction::Created => counts.relationships_created += 1,
            UpsertAction::Updated | UpsertAction::Merged { .. } => counts.relationships_updated += 1,
            UpsertAction::Skipped => {}
        }
    }
    Ok(counts)
}

fn to_entity(chunk_id: &str, candidate: &CandidateEntity) -> Entity {
    let mut entity = Entity::new(
        candidate.name.clone(),
        candidate.entity_type,
        candidate.confidence.value(),
    );
    for alias in &candidate.aliases {
        entity = entity.with_alias(alias.clone());
    }
    for mention in &candidate.mentions {
        entity = entity.with_mention(Mention::new(
            chunk_id,
            mention.span.start,
            mention.span.end,
            mention.method,
            mention.confidence.value(),
        ));
    }
    entity
}

fn to_relationship(
    chunk_id: &str,
    source: &str,
    target: &str,
    candidate: &CandidateRelationship,
) -> Relationship {
    Relationship::new(
        source,
        target,
        candidate.relationship_type,
        candidate.confidence.value(),
    )
    .with_evidence(chunk_id)
    .with_directed(candidate.directed)
}

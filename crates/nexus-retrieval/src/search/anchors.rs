//! Anchor entities: graph entities mentioned in vector-recalled chunks.

use std::collections::{BTreeMap, HashMap};

use nexus_core::errors::NexusResult;
use nexus_core::models::Entity;
use nexus_graph::GraphRead;

use crate::options::SearchOptions;

#[derive(Debug, Clone)]
pub(crate) struct Anchor {
    pub entity: Entity,
    /// Graph relevance of the anchor itself: its confidence.
    pub weight: f64,
}

#[derive(Debug, Default)]
pub(crate) struct AnchorSet {
    /// Retained anchors, strongest first, ties by id.
    pub anchors: Vec<Anchor>,
    /// Chunk id to the retained anchors mentioned in it.
    pub by_chunk: HashMap<String, Vec<String>>,
}

impl AnchorSet {
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn weight(&self, entity_id: &str) -> f64 {
        self.anchors
            .iter()
            .find(|a| a.entity.id == entity_id)
            .map_or(0.0, |a| a.weight)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.anchors.iter().map(|a| a.entity.id.clone()).collect();
        ids.sort();
        ids
    }
}

/// Collect anchors from `chunk_ids`, keeping at most `max_anchors` of those
/// at or above `min_confidence` whose type the options allow.
pub(crate) fn find_anchors(
    graph: &dyn GraphRead,
    chunk_ids: &[String],
    options: &SearchOptions,
    min_confidence: f64,
    max_anchors: usize,
) -> NexusResult<AnchorSet> {
    let mut found: BTreeMap<String, Anchor> = BTreeMap::new();
    let mut mentioned: HashMap<String, Vec<String>> = HashMap::new();

    for chunk_id in chunk_ids {
        for entity in graph.entities_in_chunk(chunk_id)? {
            let weight = entity.confidence.value();
            if weight < min_confidence || !options.allows(entity.entity_type) {
                continue;
            }
            mentioned
                .entry(chunk_id.clone())
                .or_default()
                .push(entity.id.clone());
            found
                .entry(entity.id.clone())
                .or_insert(Anchor { entity, weight });
        }
    }

    let mut anchors: Vec<Anchor> = found.into_values().collect();
    anchors.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.entity.id.cmp(&b.entity.id))
    });
    anchors.truncate(max_anchors);

    let by_chunk = mentioned
        .into_iter()
        .filter_map(|(chunk_id, mut ids)| {
            ids.retain(|id| anchors.iter().any(|a| &a.entity.id == id));
            ids.sort();
            ids.dedup();
            (!ids.is_empty()).then_some((chunk_id, ids))
        })
        .collect();

    Ok(AnchorSet { anchors, by_chunk })
}

//! One-hop graph expansion from anchor entities.
//!
//! An anchor's own chunks score `weight * decay`; chunks of a neighbor and
//! the evidence of the connecting relationship score
//! `weight * relationship confidence * decay`.

use std::collections::BTreeMap;

use nexus_core::errors::NexusResult;
use nexus_core::models::SearchCandidate;
use nexus_graph::GraphRead;

use crate::options::SearchOptions;
use crate::search::anchors::Anchor;

/// Graph-scored candidates for every chunk reachable within one hop of an
/// anchor, keyed by chunk id. Each keeps its best score and every anchor
/// that reached it.
pub(crate) fn expand(
    graph: &dyn GraphRead,
    anchors: &[Anchor],
    options: &SearchOptions,
    decay: f64,
) -> NexusResult<BTreeMap<String, SearchCandidate>> {
    let mut reached: BTreeMap<String, SearchCandidate> = BTreeMap::new();

    for anchor in anchors {
        let own = anchor.weight * decay;
        for chunk_id in anchor.entity.chunk_ids() {
            offer(&mut reached, chunk_id, own, &anchor.entity.id);
        }

        for neighbor in graph.neighbors(&anchor.entity.id)? {
            if !options.allows(neighbor.entity.entity_type) {
                continue;
            }
            let score = anchor.weight * neighbor.relationship.confidence.value() * decay;
            let chunks = neighbor
                .entity
                .chunk_ids()
                .into_iter()
                .chain(neighbor.relationship.evidence.iter().cloned());
            for chunk_id in chunks {
                offer(&mut reached, chunk_id, score, &anchor.entity.id);
            }
        }
    }
    Ok(reached)
}

fn offer(
    reached: &mut BTreeMap<String, SearchCandidate>,
    chunk_id: String,
    score: f64,
    anchor_id: &str,
) {
    let candidate = reached
        .entry(chunk_id)
        .or_insert_with_key(|id| SearchCandidate::graph(id.clone(), 0.0));
    candidate.graph_score = candidate.graph_score.max(score);
    if !candidate.anchor_entities.iter().any(|a| a == anchor_id) {
        candidate.anchor_entities.push(anchor_id.to_string());
    }
}

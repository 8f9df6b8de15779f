//! Ranking candidates derived from reasoning paths.

use std::collections::HashMap;

use nexus_core::models::{ReasoningPath, SearchCandidate};

/// One graph candidate per evidence chunk along `paths`. A chunk's graph
/// score is the best confidence of any path it supports; its anchors are the
/// entities of those paths. Order follows first appearance.
pub fn path_candidates(paths: &[ReasoningPath]) -> Vec<SearchCandidate> {
    let mut out: Vec<SearchCandidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for path in paths {
        let score = path.confidence.value();
        let entities = path.entity_ids();
        for chunk_id in path.evidence_chunks() {
            let slot = *index.entry(chunk_id.clone()).or_insert_with(|| {
                out.push(SearchCandidate::graph(chunk_id.clone(), score));
                out.len() - 1
            });
            let candidate = &mut out[slot];
            candidate.graph_score = candidate.graph_score.max(score);
            for id in &entities {
                if !candidate.anchor_entities.iter().any(|a| a == id) {
                    candidate.anchor_entities.push((*id).to_string());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::{Confidence, Hop, RelationshipType};

    fn path(confidence: f64, chunks: &[&str]) -> ReasoningPath {
        ReasoningPath {
            start_entity_id: "a".into(),
            hops: vec![Hop {
                from_entity_id: "a".into(),
                from_name: "A".into(),
                relationship_id: "r".into(),
                relationship_type: RelationshipType::Uses,
                to_entity_id: "b".into(),
                to_name: "B".into(),
                edge_confidence: Confidence::new(confidence),
                cumulative_confidence: Confidence::new(confidence),
                inverse: false,
                evidence: chunks.iter().map(|c| c.to_string()).collect(),
            }],
            confidence: Confidence::new(confidence),
            explanation: String::new(),
        }
    }

    #[test]
    fn keeps_best_score_per_chunk() {
        let candidates = path_candidates(&[path(0.4, &["c1"]), path(0.9, &["c1", "c2"])]);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].chunk_id, "c1");
        assert!((candidates[0].graph_score - 0.9).abs() < 1e-9);
        assert_eq!(candidates[0].anchor_entities, vec!["a".to_string(), "b".to_string()]);
    }
}

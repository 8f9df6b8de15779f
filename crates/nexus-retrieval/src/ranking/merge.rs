//! Combine candidate lists from several producers by chunk id.

use std::collections::HashMap;

use nexus_core::models::SearchCandidate;

/// Merge `lists` by chunk id. Per chunk the best vector score, the best
/// (lowest) vector rank, the best graph score, and the newest timestamp
/// are kept; anchors are unioned and sources combined. Output order is
/// first appearance across the lists.
pub fn merge_candidate_lists(lists: &[Vec<SearchCandidate>]) -> Vec<SearchCandidate> {
    let mut out: Vec<SearchCandidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in lists.iter().flatten() {
        match index.get(&candidate.chunk_id) {
            None => {
                index.insert(candidate.chunk_id.clone(), out.len());
                out.push(candidate.clone());
            }
            Some(&slot) => {
                let merged = &mut out[slot];
                merged.vector_score = merged.vector_score.max(candidate.vector_score);
                merged.vector_rank = match (merged.vector_rank, candidate.vector_rank) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                merged.graph_score = merged.graph_score.max(candidate.graph_score);
                merged.timestamp = merged.timestamp.max(candidate.timestamp);
                for id in &candidate.anchor_entities {
                    if !merged.anchor_entities.contains(id) {
                        merged.anchor_entities.push(id.clone());
                    }
                }
                merged.source = merged.source.combine(candidate.source);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::CandidateSource;

    #[test]
    fn keeps_maxima_and_combines_sources() {
        let mut graph = SearchCandidate::graph("c1", 0.7);
        graph.anchor_entities = vec!["e2".into()];
        let mut vector = SearchCandidate::vector("c1", 0.9, 3);
        vector.anchor_entities = vec!["e1".into()];

        let merged = merge_candidate_lists(&[
            vec![vector, SearchCandidate::vector("c2", 0.5, 4)],
            vec![graph, SearchCandidate::vector("c1", 0.4, 1)],
        ]);
        assert_eq!(merged.len(), 2);
        let c1 = &merged[0];
        assert_eq!(c1.chunk_id, "c1");
        assert!((c1.vector_score - 0.9).abs() < 1e-12);
        assert_eq!(c1.vector_rank, Some(1));
        assert!((c1.graph_score - 0.7).abs() < 1e-12);
        assert_eq!(c1.anchor_entities, vec!["e1".to_string(), "e2".to_string()]);
        assert_eq!(c1.source, CandidateSource::Both);
        assert_eq!(merged[1].chunk_id, "c2");
    }
}

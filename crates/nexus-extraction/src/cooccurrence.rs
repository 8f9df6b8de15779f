//! `related_to` edges between entities mentioned close together.

use std::collections::HashSet;

use nexus_core::models::{
    CandidateEntity, CandidateRelationship, Confidence, ExtractionMethod, RelationshipType,
};

/// Parameters for co-occurrence analysis.
#[derive(Debug, Clone, Copy)]
pub struct CoOccurrenceParams {
    /// Maximum character distance between two mentions.
    pub window: usize,
    /// Confidence at distance zero.
    pub base_confidence: f64,
    /// Confidence at the edge of the window.
    pub floor: f64,
}

/// Linear decay from `base_confidence` at distance 0 to `floor` at `window`.
pub fn decayed_confidence(params: &CoOccurrenceParams, distance: usize) -> f64 {
    if params.window == 0 {
        return params.base_confidence;
    }
    let frac = (distance as f64 / params.window as f64).min(1.0);
    params.floor + (params.base_confidence - params.floor) * (1.0 - frac)
}

/// Emit one undirected `related_to` per entity pair whose closest mentions
/// lie within the window. Pairs in `linked` (already related by a pattern,
/// in either direction) are skipped.
pub fn analyze(
    entities: &[CandidateEntity],
    params: &CoOccurrenceParams,
    linked: &HashSet<(String, String)>,
) -> Vec<CandidateRelationship> {
    let mut out = Vec::new();
    for (i, a) in entities.iter().enumerate() {
        for b in &entities[i + 1..] {
            if linked.contains(&(a.key.clone(), b.key.clone()))
                || linked.contains(&(b.key.clone(), a.key.clone()))
            {
                continue;
            }
            let Some(distance) = closest_distance(a, b) else {
                continue;
            };
            if distance > params.window {
                continue;
            }
            out.push(CandidateRelationship {
                source_key: a.key.clone(),
                target_key: b.key.clone(),
                relationship_type: RelationshipType::RelatedTo,
                confidence: Confidence::new(decayed_confidence(params, distance)),
                directed: false,
                method: ExtractionMethod::CoOccurrence,
            });
        }
    }
    out
}

fn closest_distance(a: &CandidateEntity, b: &CandidateEntity) -> Option<usize> {
    a.mentions
        .iter()
        .flat_map(|ma| b.mentions.iter().map(move |mb| ma.span.distance(&mb.span)))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::models::{CandidateMention, EntityType, Span};

    fn entity(key: &str, start: usize, end: usize) -> CandidateEntity {
        CandidateEntity {
            key: key.into(),
            name: key.into(),
            entity_type: EntityType::Person,
            confidence: Confidence::new(0.8),
            aliases: vec![key.into()],
            mentions: vec![CandidateMention {
                span: Span::new(start, end),
                method: ExtractionMethod::Pattern,
                confidence: Confidence::new(0.8),
            }],
        }
    }

    const PARAMS: CoOccurrenceParams = CoOccurrenceParams {
        window: 100,
        base_confidence: 0.6,
        floor: 0.2,
    };

    #[test]
    fn confidence_decays_linearly() {
        assert!((decayed_confidence(&PARAMS, 0) - 0.6).abs() < 1e-9);
        assert!((decayed_confidence(&PARAMS, 50) - 0.4).abs() < 1e-9);
        assert!((decayed_confidence(&PARAMS, 100) - 0.2).abs() < 1e-9);
        assert!((decayed_confidence(&PARAMS, 500) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn pairs_outside_window_are_skipped() {
        let es = vec![entity("a", 0, 5), entity("b", 10, 15), entity("c", 400, 405)];
        let rels = analyze(&es, &PARAMS, &HashSet::new());
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source_key, "a");
        assert_eq!(rels[0].target_key, "b");
        assert!(!rels[0].directed);
    }

    #[test]
    fn linked_pairs_are_not_duplicated() {
        let es = vec![entity("a", 0, 5), entity("b", 10, 15)];
        let mut linked = HashSet::new();
        linked.insert(("b".to_string(), "a".to_string()));
        assert!(analyze(&es, &PARAMS, &linked).is_empty());
    }
}

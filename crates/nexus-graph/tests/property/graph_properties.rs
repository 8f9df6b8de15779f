//! Property tests for nexus-graph: merge invariants over random merge plans.

use proptest::prelude::*;

use nexus_core::config::GraphConfig;
use nexus_core::models::{
    Entity, EntityType, ExtractionMethod, Mention, Relationship, RelationshipFilter,
    RelationshipType,
};
use nexus_graph::GraphStore;

const NODES: usize = 8;

fn seeded(edges: &[(usize, usize)]) -> (GraphStore, Vec<String>) {
    let store = GraphStore::new(GraphConfig {
        auto_merge: false,
        ..GraphConfig::default()
    });
    let names = [
        "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel",
    ];
    let ids: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            store
                .upsert_entity(
                    Entity::new(*name, EntityType::Organization, 0.5 + i as f64 * 0.05)
                        .with_mention(Mention::new(
                            format!("c{i}"),
                            0,
                            name.len(),
                            ExtractionMethod::Pattern,
                            0.8,
                        )),
                )
                .unwrap()
                .id
        })
        .collect();
    for (s, t) in edges {
        if s != t {
            store
                .upsert_relationship(Relationship::new(
                    &ids[*s],
                    &ids[*t],
                    RelationshipType::PartOf,
                    0.6,
                ))
                .unwrap();
        }
    }
    (store, ids)
}

fn edges() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..NODES, 0..NODES), 0..20)
}

fn merges() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..NODES, 0..NODES), 1..10)
}

// =============================================================================
// No relationship references a merged-away entity after any merge sequence
// =============================================================================
proptest! {
    #[test]
    fn merges_leave_no_edge_on_a_tombstone(edges in edges(), plan in merges()) {
        let (store, ids) = seeded(&edges);
        for (p, d) in plan {
            store.merge_entities(&ids[p], &[ids[d].clone()]).unwrap();
        }

        let report = store.validate_consistency();
        prop_assert!(report.is_consistent(), "{:?}", report.violations);
        for rel in store.get_relationships(&RelationshipFilter::default()) {
            prop_assert!(store.get_entity(&rel.source_id).unwrap().is_active());
            prop_assert!(store.get_entity(&rel.target_id).unwrap().is_active());
            prop_assert!(!rel.is_self_loop());
        }
    }
}

// =============================================================================
// Mentions are conserved and re-merging is a no-op
// =============================================================================
proptest! {
    #[test]
    fn merge_conserves_mentions_and_is_idempotent(edges in edges(), plan in merges()) {
        let (store, ids) = seeded(&edges);
        for (p, d) in &plan {
            store.merge_entities(&ids[*p], &[ids[*d].clone()]).unwrap();
        }
        let total: usize = ids
            .iter()
            .filter_map(|id| store.get_entity(id))
            .map(|e| e.mention_count())
            .sum();
        prop_assert_eq!(total, NODES);

        let relationships_before = store.relationship_count();
        let entities_before = store.entity_count();
        for (p, d) in &plan {
            let report = store.merge_entities(&ids[*p], &[ids[*d].clone()]).unwrap();
            prop_assert!(report.is_noop());
        }
        prop_assert_eq!(store.relationship_count(), relationships_before);
        prop_assert_eq!(store.entity_count(), entities_before);
    }
}

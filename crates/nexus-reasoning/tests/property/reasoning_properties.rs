//! Property tests for nexus-reasoning: confidence monotonicity and cycle
//! safety on random graphs, cycles included.

use std::collections::HashSet;

use proptest::prelude::*;

use nexus_core::config::{GraphConfig, ReasoningConfig};
use nexus_core::models::{Entity, EntityType, Relationship, RelationshipType};
use nexus_graph::GraphStore;
use nexus_reasoning::{ReasoningEngine, ReasoningOptions};

const NODES: usize = 10;

fn build(edges: &[(usize, usize, f64, bool)]) -> (GraphStore, Vec<String>) {
    let store = GraphStore::new(GraphConfig {
        auto_merge: false,
        ..GraphConfig::default()
    });
    let ids: Vec<String> = (0..NODES)
        .map(|i| {
            store
                .upsert_entity(
                    Entity::new(format!("Node{i}"), EntityType::Concept, 0.9)
                        .with_id(format!("n{i}")),
                )
                .unwrap()
                .id
        })
        .collect();
    for (s, t, c, directed) in edges {
        if s != t {
            let kind = if *directed {
                RelationshipType::Uses
            } else {
                RelationshipType::RelatedTo
            };
            store
                .upsert_relationship(Relationship::new(&ids[*s], &ids[*t], kind, *c))
                .unwrap();
        }
    }
    (store, ids)
}

fn edges() -> impl Strategy<Value = Vec<(usize, usize, f64, bool)>> {
    prop::collection::vec((0..NODES, 0..NODES, 0.05f64..=1.0, any::<bool>()), 0..40)
}

fn options() -> impl Strategy<Value = ReasoningOptions> {
    (1usize..6, 0.0f64..0.5, 1usize..20, 1usize..200, any::<bool>()).prop_map(
        |(max_depth, min_confidence, max_paths, max_expanded_nodes, traverse_inverse)| {
            ReasoningOptions {
                max_depth,
                min_confidence,
                max_paths,
                max_expanded_nodes,
                traverse_inverse,
                relationship_types: Vec::new(),
            }
        },
    )
}

// =============================================================================
// Confidence never increases along a path and respects the floor
// =============================================================================
proptest! {
    #[test]
    fn path_confidence_is_monotone(
        edges in edges(),
        opts in options(),
        start in 0..NODES,
        target in prop::option::of(0..NODES),
    ) {
        let (store, ids) = build(&edges);
        let engine = ReasoningEngine::new(ReasoningConfig::default());
        let targets: Vec<String> = target.map(|t| vec![ids[t].clone()]).unwrap_or_default();
        let result = engine.reason(&store, &[ids[start].clone()], &targets, &opts).unwrap();

        for path in &result.paths {
            let mut previous = 1.0f64;
            for hop in &path.hops {
                let c = hop.cumulative_confidence.value();
                prop_assert!(c <= previous + 1e-12);
                prop_assert!(c >= opts.min_confidence);
                previous = c;
            }
            prop_assert!((path.confidence.value() - previous).abs() < 1e-12);
            prop_assert!(path.depth() <= opts.max_depth);
        }
    }
}

// =============================================================================
// Cycle safety: no path revisits an entity, expansion never exceeds the cap
// =============================================================================
proptest! {
    #[test]
    fn traversal_is_cycle_safe_and_bounded(
        edges in edges(),
        opts in options(),
        start in 0..NODES,
    ) {
        let (store, ids) = build(&edges);
        let engine = ReasoningEngine::new(ReasoningConfig::default());
        let result = engine.reason(&store, &[ids[start].clone()], &[], &opts).unwrap();

        prop_assert!(result.nodes_expanded <= opts.max_expanded_nodes);
        prop_assert!(result.paths.len() <= opts.max_paths);
        for path in &result.paths {
            let mut seen = HashSet::new();
            for id in path.entity_ids() {
                prop_assert!(seen.insert(id), "entity {} revisited", id);
            }
            prop_assert!(path.confidence.value() <= 1.0);
        }
    }
}

// =============================================================================
// Exploratory results come out in non-increasing confidence order
// =============================================================================
proptest! {
    #[test]
    fn exploratory_paths_are_sorted(edges in edges(), opts in options(), start in 0..NODES) {
        let (store, ids) = build(&edges);
        let engine = ReasoningEngine::new(ReasoningConfig::default());
        let result = engine.reason(&store, &[ids[start].clone()], &[], &opts).unwrap();
        for pair in result.paths.windows(2) {
            prop_assert!(pair[0].confidence.value() >= pair[1].confidence.value());
        }
    }
}

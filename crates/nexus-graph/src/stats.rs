use std::collections::{BTreeMap, HashMap};

use petgraph::algo::connected_components;
use petgraph::graph::UnGraph;

use nexus_core::models::GraphStatistics;

use crate::store::GraphStore;

impl GraphStore {
    /// Counts, histograms, density, and connected components over a
    /// point-in-time snapshot of the active graph.
    pub fn get_statistics(&self) -> GraphStatistics {
        let mut stats = GraphStatistics::default();
        let mut graph: UnGraph<(), ()> = UnGraph::new_undirected();
        let mut nodes = HashMap::new();
        let mut confidence_sum = 0.0;

        for entity in self.entities.iter() {
            if !entity.is_active() {
                stats.merged_count += 1;
                continue;
            }
            stats.node_count += 1;
            stats.mention_count += entity.mention_count();
            confidence_sum += entity.confidence.value();
            *stats
                .entity_types
                .entry(entity.entity_type.as_str().to_string())
                .or_insert(0) += 1;
            nodes.insert(entity.id.clone(), graph.add_node(()));
        }

        let mut relationship_types: BTreeMap<String, usize> = BTreeMap::new();
        for rel in self.relationships.iter() {
            stats.edge_count += 1;
            *relationship_types
                .entry(rel.relationship_type.as_str().to_string())
                .or_insert(0) += 1;
            if let (Some(a), Some(b)) = (nodes.get(&rel.source_id), nodes.get(&rel.target_id)) {
                graph.add_edge(*a, *b, ());
            }
        }
        stats.relationship_types = relationship_types;

        let n = stats.node_count as f64;
        stats.density = if stats.node_count > 1 {
            stats.edge_count as f64 / (n * (n - 1.0))
        } else {
            0.0
        };
        stats.average_entity_confidence = if stats.node_count > 0 {
            confidence_sum / n
        } else {
            0.0
        };
        stats.connected_components = connected_components(&graph);
        stats.pending_dedup_candidates = self.candidates.len();
        stats
    }
}

//! Targeted breadth-first and exploratory best-first path search.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use tracing::warn;

use nexus_core::models::{Confidence, Entity, Hop, ReasoningPath};
use nexus_graph::{GraphRead, Neighbor};

use crate::explain::explain_path;
use crate::options::ReasoningOptions;

/// A partial path with its own visited set.
#[derive(Debug, Clone)]
pub(crate) struct PathState {
    start_id: String,
    tip_id: String,
    tip_name: String,
    hops: Vec<Hop>,
    visited: HashSet<String>,
    confidence: Confidence,
}

impl PathState {
    pub fn root(entity: &Entity) -> Self {
        Self {
            start_id: entity.id.clone(),
            tip_id: entity.id.clone(),
            tip_name: entity.canonical_name.clone(),
            hops: Vec::new(),
            visited: HashSet::from([entity.id.clone()]),
            confidence: Confidence::ONE,
        }
    }

    pub fn tip(&self) -> &str {
        &self.tip_id
    }

    pub fn depth(&self) -> usize {
        self.hops.len()
    }

    fn extend(&self, neighbor: &Neighbor, inverse: bool, confidence: Confidence) -> Self {
        let rel = &neighbor.relationship;
        let mut next = self.clone();
        next.hops.push(Hop {
            from_entity_id: self.tip_id.clone(),
            from_name: self.tip_name.clone(),
            relationship_id: rel.id.clone(),
            relationship_type: rel.relationship_type,
            to_entity_id: neighbor.entity.id.clone(),
            to_name: neighbor.entity.canonical_name.clone(),
            edge_confidence: rel.confidence,
            cumulative_confidence: confidence,
            inverse,
            evidence: rel.evidence.clone(),
        });
        next.visited.insert(neighbor.entity.id.clone());
        next.tip_id = neighbor.entity.id.clone();
        next.tip_name = neighbor.entity.canonical_name.clone();
        next.confidence = confidence;
        next
    }

    pub fn into_path(self) -> ReasoningPath {
        let explanation = explain_path(&self.hops);
        ReasoningPath {
            start_entity_id: self.start_id,
            hops: self.hops,
            confidence: self.confidence,
            explanation,
        }
    }
}

/// Global node-expansion budget.
pub(crate) struct Budget {
    cap: usize,
    pub expanded: usize,
    pub exhausted: bool,
}

impl Budget {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            expanded: 0,
            exhausted: false,
        }
    }

    fn take(&mut self) -> bool {
        if self.expanded >= self.cap {
            self.exhausted = true;
            return false;
        }
        self.expanded += 1;
        true
    }
}

/// Children of `path` that respect the per-path visited set, the
/// relationship filter, direction rules, and the confidence floor.
fn expand(
    graph: &dyn GraphRead,
    path: &PathState,
    options: &ReasoningOptions,
    budget: &mut Budget,
) -> Vec<PathState> {
    if !budget.take() {
        return Vec::new();
    }
    let neighbors = match graph.neighbors(path.tip()) {
        Ok(neighbors) => neighbors,
        Err(e) => {
            warn!(entity = path.tip(), error = %e, "neighbor lookup failed, branch skipped");
            return Vec::new();
        }
    };
    neighbors
        .iter()
        .filter(|n| options.allows(n.relationship.relationship_type))
        .filter(|n| !path.visited.contains(&n.entity.id))
        .filter_map(|n| {
            let inverse = n.relationship.directed && !n.outgoing;
            if inverse && !options.traverse_inverse {
                return None;
            }
            let confidence = path.confidence * n.relationship.confidence;
            (confidence.value() >= options.min_confidence)
                .then(|| path.extend(n, inverse, confidence))
        })
        .collect()
}

/// Level-by-level search from `roots` toward `targets`. Stops after the
/// first level at which every target has been reached, so the fewest-hop
/// paths always win. Paths ending on a target are not extended.
pub(crate) fn targeted(
    graph: &dyn GraphRead,
    roots: Vec<PathState>,
    targets: &HashSet<String>,
    options: &ReasoningOptions,
    budget: &mut Budget,
) -> Vec<ReasoningPath> {
    let mut found: Vec<PathState> = Vec::new();
    let mut reached: HashSet<String> = HashSet::new();
    let mut frontier = Vec::new();
    for root in roots {
        if targets.contains(root.tip()) {
            reached.insert(root.tip().to_string());
            found.push(root);
        } else {
            frontier.push(root);
        }
    }

    for _ in 0..options.max_depth {
        if frontier.is_empty() || reached.len() == targets.len() {
            break;
        }
        let mut next = Vec::new();
        for path in &frontier {
            for child in expand(graph, path, options, budget) {
                if targets.contains(child.tip()) {
                    reached.insert(child.tip().to_string());
                    found.push(child);
                } else {
                    next.push(child);
                }
            }
            if budget.exhausted {
                break;
            }
        }
        if budget.exhausted {
            break;
        }
        frontier = next;
    }

    found.sort_by(|a, b| {
        a.depth()
            .cmp(&b.depth())
            .then_with(|| b.confidence.value().total_cmp(&a.confidence.value()))
            .then_with(|| a.tip_id.cmp(&b.tip_id))
    });
    found.truncate(options.max_paths);
    found.into_iter().map(PathState::into_path).collect()
}

struct Queued {
    path: PathState,
    seq: usize,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap order: higher confidence, then fewer hops, then first queued.
impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .confidence
            .value()
            .total_cmp(&other.path.confidence.value())
            .then_with(|| other.path.depth().cmp(&self.path.depth()))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Best-first search returning the `max_paths` highest-confidence paths.
///
/// Confidence never increases along a path, so paths leave the heap in
/// non-increasing confidence order and the first `max_paths` non-empty
/// paths popped are the best ones reachable within the depth limit.
pub(crate) fn exploratory(
    graph: &dyn GraphRead,
    roots: Vec<PathState>,
    options: &ReasoningOptions,
    budget: &mut Budget,
) -> Vec<ReasoningPath> {
    let mut heap = BinaryHeap::new();
    let mut seq = 0;
    for path in roots {
        heap.push(Queued { path, seq });
        seq += 1;
    }

    let mut results = Vec::new();
    while let Some(Queued { path, .. }) = heap.pop() {
        let last = path.depth() > 0 && results.len() + 1 >= options.max_paths;
        if !last && path.depth() < options.max_depth && !budget.exhausted {
            for child in expand(graph, &path, options, budget) {
                heap.push(Queued { path: child, seq });
                seq += 1;
            }
        }
        if path.depth() > 0 {
            results.push(path);
        }
        if last {
            break;
        }
    }
    results.into_iter().map(PathState::into_path).collect()
}

//! HybridSearch: vector recall fused with graph-anchored expansion.

pub(crate) mod anchors;
pub(crate) mod expansion;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use nexus_core::config::SearchConfig;
use nexus_core::errors::{NexusResult, SearchError};
use nexus_core::models::{CandidateSource, SearchCandidate};
use nexus_core::search_span;
use nexus_core::traits::IVectorSearch;
use nexus_graph::GraphRead;

use crate::options::SearchOptions;
use crate::ranking::merge::merge_candidate_lists;
use anchors::find_anchors;

/// Unranked hybrid search output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Vector hits in vector rank order, then graph-only chunks by
    /// descending graph score.
    pub candidates: Vec<SearchCandidate>,
    /// Anchor entity ids, sorted.
    pub anchors: Vec<String>,
    /// The graph could not be read and results are vector-only.
    pub degraded: bool,
    pub warnings: Vec<String>,
}

/// Stage 1 of retrieval. Vector recall is mandatory: its failure fails the
/// request. Graph failures only degrade the result.
pub struct HybridSearch {
    vector: Arc<dyn IVectorSearch>,
    graph: Arc<dyn GraphRead>,
    config: SearchConfig,
}

impl HybridSearch {
    pub fn new(vector: Arc<dyn IVectorSearch>, graph: Arc<dyn GraphRead>, config: SearchConfig) -> Self {
        Self {
            vector,
            graph,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn default_options(&self) -> SearchOptions {
        SearchOptions::from_config(&self.config)
    }

    pub fn search(&self, embedding: &[f32], options: &SearchOptions) -> NexusResult<SearchOutcome> {
        options.validate()?;
        if embedding.is_empty() {
            return Err(SearchError::InvalidQuery {
                reason: "query embedding is empty".to_string(),
            }
            .into());
        }
        let span = search_span!(options.limit);
        let _entered = span.enter();

        let hits = self.vector.search(embedding, options.vector_k, &options.filters)?;
        let vector: Vec<SearchCandidate> = hits
            .into_iter()
            .enumerate()
            .map(|(rank, (chunk_id, score))| SearchCandidate::vector(chunk_id, score, rank))
            .collect();
        let vector = merge_candidate_lists(&[vector]);

        let outcome = match self.graph_signal(vector.clone(), options) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "graph read failed, degrading to vector-only search");
                SearchOutcome {
                    candidates: vector,
                    anchors: Vec::new(),
                    degraded: true,
                    warnings: vec![format!("graph unavailable, results are vector-only: {e}")],
                }
            }
        };
        if outcome.anchors.is_empty() && !outcome.degraded {
            debug!("no graph anchors, returning vector-only candidates");
        }
        Ok(outcome)
    }

    fn graph_signal(
        &self,
        mut vector: Vec<SearchCandidate>,
        options: &SearchOptions,
    ) -> NexusResult<SearchOutcome> {
        let chunk_ids: Vec<String> = vector.iter().map(|c| c.chunk_id.clone()).collect();
        let anchors = find_anchors(
            self.graph.as_ref(),
            &chunk_ids,
            options,
            self.config.min_anchor_confidence,
            self.config.max_anchors,
        )?;
        if anchors.is_empty() {
            return Ok(SearchOutcome {
                candidates: vector,
                ..SearchOutcome::default()
            });
        }

        for candidate in &mut vector {
            if let Some(ids) = anchors.by_chunk.get(&candidate.chunk_id) {
                candidate.graph_score = ids
                    .iter()
                    .map(|id| anchors.weight(id))
                    .fold(0.0, f64::max);
                candidate.anchor_entities = ids.clone();
                candidate.source = CandidateSource::Both;
            }
        }

        let mut graph_only = Vec::new();
        if options.expand {
            let reached = expansion::expand(
                self.graph.as_ref(),
                &anchors.anchors,
                options,
                self.config.expansion_decay,
            )?;
            let retrieved: HashSet<&str> = chunk_ids.iter().map(String::as_str).collect();
            for (chunk_id, found) in reached {
                if retrieved.contains(chunk_id.as_str()) {
                    if let Some(candidate) = vector.iter_mut().find(|c| c.chunk_id == chunk_id) {
                        absorb(candidate, found);
                    }
                } else if options.filters.chunk_ids.is_empty()
                    || options.filters.chunk_ids.contains(&chunk_id)
                {
                    graph_only.push(found);
                }
            }
            graph_only.sort_by(|a, b| {
                b.graph_score
                    .total_cmp(&a.graph_score)
                    .then_with(|| a.chunk_id.cmp(&b.chunk_id))
            });
            graph_only.truncate(options.max_expansion);
        }

        debug!(
            anchors = anchors.anchors.len(),
            vector = vector.len(),
            expanded = graph_only.len(),
            "hybrid candidates gathered"
        );
        vector.extend(graph_only);
        Ok(SearchOutcome {
            candidates: vector,
            anchors: anchors.ids(),
            degraded: false,
            warnings: Vec::new(),
        })
    }
}

/// Fold an expansion hit into a vector-retrieved candidate.
fn absorb(candidate: &mut SearchCandidate, found: SearchCandidate) {
    candidate.graph_score = candidate.graph_score.max(found.graph_score);
    for id in found.anchor_entities {
        if !candidate.anchor_entities.contains(&id) {
            candidate.anchor_entities.push(id);
        }
    }
    candidate.anchor_entities.sort();
    candidate.source = CandidateSource::Both;
}

//! RetrievalEngine: hybrid search followed by ranking.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use nexus_core::errors::NexusResult;
use nexus_core::models::{CandidateSource, ChunkFilter, RankedCandidate, SearchCandidate};
use nexus_core::traits::IChunkSource;

use crate::options::SearchOptions;
use crate::ranking::merge::merge_candidate_lists;
use crate::ranking::RankingEngine;
use crate::search::{HybridSearch, SearchOutcome};

/// Ranked search results with their anchors and any degradation notice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<RankedCandidate>,
    pub anchors: Vec<String>,
    pub degraded: bool,
    pub warnings: Vec<String>,
    /// Candidates considered before the limit was applied.
    pub total_candidates: usize,
}

pub struct RetrievalEngine {
    hybrid: HybridSearch,
    ranking: RankingEngine,
    chunks: Option<Arc<dyn IChunkSource>>,
}

impl RetrievalEngine {
    pub fn new(hybrid: HybridSearch, ranking: RankingEngine) -> Self {
        Self {
            hybrid,
            ranking,
            chunks: None,
        }
    }

    /// Chunk store used for recency timestamps and for applying source
    /// filters to graph-expanded chunks.
    pub fn with_chunk_source(mut self, chunks: Arc<dyn IChunkSource>) -> Self {
        self.ranking = self.ranking.with_chunk_source(Arc::clone(&chunks));
        self.chunks = Some(chunks);
        self
    }

    pub fn hybrid(&self) -> &HybridSearch {
        &self.hybrid
    }

    pub fn ranking(&self) -> &RankingEngine {
        &self.ranking
    }

    pub fn default_options(&self) -> SearchOptions {
        self.hybrid.default_options()
    }

    pub fn search(&self, embedding: &[f32], options: &SearchOptions) -> NexusResult<SearchResponse> {
        self.search_with(embedding, options, &[])
    }

    /// Search, folding `extra` candidates (e.g. from reasoning paths) into
    /// the hybrid candidates before ranking.
    pub fn search_with(
        &self,
        embedding: &[f32],
        options: &SearchOptions,
        extra: &[SearchCandidate],
    ) -> NexusResult<SearchResponse> {
        let mut outcome = self.hybrid.search(embedding, options)?;
        self.apply_source_filter(&mut outcome, options);

        let candidates = if extra.is_empty() {
            outcome.candidates
        } else {
            merge_candidate_lists(&[outcome.candidates, extra.to_vec()])
        };
        let total_candidates = candidates.len();
        let mut results = self.ranking.rank(candidates);
        results.truncate(options.limit);

        info!(
            results = results.len(),
            candidates = total_candidates,
            anchors = outcome.anchors.len(),
            degraded = outcome.degraded,
            "search complete"
        );
        Ok(SearchResponse {
            results,
            anchors: outcome.anchors,
            degraded: outcome.degraded,
            warnings: outcome.warnings,
            total_candidates,
        })
    }

    /// Vector search applies source filters itself. Graph-expanded chunks
    /// are checked against the chunk store, or dropped when that is not
    /// possible.
    fn apply_source_filter(&self, outcome: &mut SearchOutcome, options: &SearchOptions) {
        if options.filters.source_ids.is_empty() {
            return;
        }
        let graph_only: Vec<String> = outcome
            .candidates
            .iter()
            .filter(|c| c.source == CandidateSource::Graph)
            .map(|c| c.chunk_id.clone())
            .collect();
        if graph_only.is_empty() {
            return;
        }
        let allowed: HashSet<String> = match &self.chunks {
            Some(chunks) => {
                let filter = ChunkFilter {
                    source_ids: options.filters.source_ids.clone(),
                    chunk_ids: graph_only,
                    metadata: options.filters.metadata.clone(),
                };
                match chunks.get_chunks_by_filter(&filter) {
                    Ok(found) => found.into_iter().map(|c| c.id).collect(),
                    Err(e) => {
                        warn!(error = %e, "cannot apply source filter to expanded chunks, dropping them");
                        outcome
                            .warnings
                            .push(format!("graph-expanded chunks dropped: {e}"));
                        HashSet::new()
                    }
                }
            }
            None => HashSet::new(),
        };
        outcome
            .candidates
            .retain(|c| c.source != CandidateSource::Graph || allowed.contains(&c.chunk_id));
    }
}

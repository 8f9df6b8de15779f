//! RankingEngine: fuse vector, graph, and recency signals into one
//! deterministic ordering with per-signal breakdowns.

pub mod merge;
pub mod scorer;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use nexus_core::config::RankingConfig;
use nexus_core::models::{RankedCandidate, SearchCandidate};
use nexus_core::traits::IChunkSource;

use scorer::{score_all, SignalWeights};

pub struct RankingEngine {
    config: RankingConfig,
    chunks: Option<Arc<dyn IChunkSource>>,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self {
            config,
            chunks: None,
        }
    }

    /// Look up missing chunk timestamps for the recency signal.
    pub fn with_chunk_source(mut self, chunks: Arc<dyn IChunkSource>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Rank with the configured weights at the current time.
    pub fn rank(&self, candidates: Vec<SearchCandidate>) -> Vec<RankedCandidate> {
        let candidates = self.with_timestamps(candidates, &self.config);
        rank_at(&candidates, &self.config, Utc::now())
    }

    /// Rank with caller-supplied weights at the current time.
    pub fn rank_with(
        &self,
        candidates: Vec<SearchCandidate>,
        weights: &RankingConfig,
    ) -> Vec<RankedCandidate> {
        let candidates = self.with_timestamps(candidates, weights);
        rank_at(&candidates, weights, Utc::now())
    }

    fn with_timestamps(
        &self,
        mut candidates: Vec<SearchCandidate>,
        weights: &RankingConfig,
    ) -> Vec<SearchCandidate> {
        let Some(chunks) = &self.chunks else {
            return candidates;
        };
        if weights.recency_weight <= 0.0 {
            return candidates;
        }
        for candidate in candidates.iter_mut().filter(|c| c.timestamp.is_none()) {
            match chunks.chunk_timestamp(&candidate.chunk_id) {
                Ok(timestamp) => candidate.timestamp = timestamp,
                Err(e) => {
                    warn!(error = %e, "chunk timestamps unavailable, recency signal skipped");
                    break;
                }
            }
        }
        candidates
    }
}

/// Pure ranking at a fixed instant. Identical inputs always produce
/// identical output.
///
/// Sort: combined score descending, then vector rank ascending (graph-only
/// candidates last), then chunk id.
pub fn rank_at(
    candidates: &[SearchCandidate],
    weights: &RankingConfig,
    now: DateTime<Utc>,
) -> Vec<RankedCandidate> {
    let normalized = SignalWeights::normalized(weights);
    let breakdowns = score_all(candidates, normalized, weights.recency_half_life_days, now);

    let mut ranked: Vec<(Option<usize>, RankedCandidate)> = candidates
        .iter()
        .zip(breakdowns)
        .map(|(c, breakdown)| {
            let combined_score = breakdown.vector_contribution
                + breakdown.graph_contribution
                + breakdown.recency_contribution;
            (
                c.vector_rank,
                RankedCandidate {
                    rank: 0,
                    chunk_id: c.chunk_id.clone(),
                    vector_score: c.vector_score,
                    graph_score: c.graph_score,
                    combined_score,
                    anchor_entities: c.anchor_entities.clone(),
                    breakdown,
                    source: c.source,
                },
            )
        })
        .collect();

    ranked.sort_by(|(rank_a, a), (rank_b, b)| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| match (rank_a, rank_b) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (_, mut candidate))| {
            candidate.rank = i + 1;
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_signal_can_lift_a_weaker_vector_hit() {
        let mut weak = SearchCandidate::vector("weak", 0.7, 1);
        weak.graph_score = 1.0;
        let strong = SearchCandidate::vector("strong", 0.8, 0);
        let ranked = rank_at(&[strong, weak], &RankingConfig::default(), Utc::now());
        assert_eq!(ranked[0].chunk_id, "weak");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn ties_break_by_vector_rank() {
        let a = SearchCandidate::vector("b-chunk", 0.5, 0);
        let b = SearchCandidate::vector("a-chunk", 0.5, 1);
        let ranked = rank_at(&[b, a], &RankingConfig::default(), Utc::now());
        assert_eq!(ranked[0].chunk_id, "b-chunk");
    }

    #[test]
    fn contributions_sum_to_combined() {
        let mut c = SearchCandidate::vector("c", 0.6, 0);
        c.graph_score = 0.4;
        c.timestamp = Some(Utc::now());
        let ranked = rank_at(&[c], &RankingConfig::default(), Utc::now());
        let b = ranked[0].breakdown;
        let sum = b.vector_contribution + b.graph_contribution + b.recency_contribution;
        assert!((sum - ranked[0].combined_score).abs() < 1e-12);
        assert!((ranked[0].combined_score - 1.0).abs() < 1e-9);
    }

    fn weights(vector: f64, graph: f64) -> RankingConfig {
        RankingConfig {
            vector_weight: vector,
            graph_weight: graph,
            recency_weight: 0.0,
            ..RankingConfig::default()
        }
    }

    #[test]
    fn caller_weights_reorder_the_same_candidates() {
        let mut semantic = SearchCandidate::vector("semantic", 0.9, 0);
        semantic.graph_score = 0.1;
        let mut connected = SearchCandidate::vector("connected", 0.3, 1);
        connected.graph_score = 1.0;
        let candidates = vec![semantic, connected];
        let engine = RankingEngine::new(RankingConfig::default());

        let by_vector = engine.rank_with(candidates.clone(), &weights(0.9, 0.1));
        let by_graph = engine.rank_with(candidates, &weights(0.1, 0.9));

        assert_eq!(by_vector[0].chunk_id, "semantic");
        assert_eq!(by_graph[0].chunk_id, "connected");
        assert!((by_vector[0].breakdown.vector_contribution - 0.9).abs() < 1e-9);
        assert!((by_graph[0].breakdown.graph_contribution - 0.9).abs() < 1e-9);
    }
}

//! Signal normalization and weighting.
//!
//! Signals: vector similarity, graph relevance, recency. Each is
//! max-normalized to [0, 1] over the candidate list; the combined score is
//! the weighted sum with weights normalized to sum to 1.

use chrono::{DateTime, Utc};

use nexus_core::config::RankingConfig;
use nexus_core::models::{SearchCandidate, SignalBreakdown};

/// Weights after normalization. Non-finite or negative weights count as 0;
/// an all-zero set falls back to vector similarity alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub vector: f64,
    pub graph: f64,
    pub recency: f64,
}

impl SignalWeights {
    pub fn normalized(config: &RankingConfig) -> Self {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let (v, g, r) = (
            clean(config.vector_weight),
            clean(config.graph_weight),
            clean(config.recency_weight),
        );
        let sum = v + g + r;
        if sum <= 0.0 {
            return Self {
                vector: 1.0,
                graph: 0.0,
                recency: 0.0,
            };
        }
        Self {
            vector: v / sum,
            graph: g / sum,
            recency: r / sum,
        }
    }
}

/// Exponential decay: 1.0 at `now`, 0.5 after one half-life.
pub fn recency_score(timestamp: DateTime<Utc>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return 0.0;
    }
    let age_days = (now - timestamp).num_seconds().max(0) as f64 / 86_400.0;
    0.5f64.powf(age_days / half_life_days)
}

/// Per-candidate breakdowns, index-aligned with `candidates`.
pub(crate) fn score_all(
    candidates: &[SearchCandidate],
    weights: SignalWeights,
    half_life_days: f64,
    now: DateTime<Utc>,
) -> Vec<SignalBreakdown> {
    let raw: Vec<(f64, f64, f64)> = candidates
        .iter()
        .map(|c| {
            let recency = c
                .timestamp
                .map_or(0.0, |t| recency_score(t, now, half_life_days));
            (non_negative(c.vector_score), non_negative(c.graph_score), recency)
        })
        .collect();
    let (max_v, max_g, max_r) = raw.iter().fold((0.0f64, 0.0f64, 0.0f64), |m, r| {
        (m.0.max(r.0), m.1.max(r.1), m.2.max(r.2))
    });

    raw.iter()
        .map(|&(v, g, r)| {
            let vector = normalize(v, max_v);
            let graph = normalize(g, max_g);
            let recency = normalize(r, max_r);
            SignalBreakdown {
                vector,
                graph,
                recency,
                vector_contribution: weights.vector * vector,
                graph_contribution: weights.graph * graph,
                recency_contribution: weights.recency * recency,
            }
        })
        .collect()
}

fn non_negative(x: f64) -> f64 {
    if x.is_finite() {
        x.max(0.0)
    } else {
        0.0
    }
}

fn normalize(x: f64, max: f64) -> f64 {
    if max > 0.0 {
        (x / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

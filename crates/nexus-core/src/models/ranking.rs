use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a search candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Vector,
    Graph,
    Both,
}

impl CandidateSource {
    pub fn combine(self, other: CandidateSource) -> CandidateSource {
        if self == other {
            self
        } else {
            CandidateSource::Both
        }
    }
}

/// A chunk candidate prior to ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub chunk_id: String,
    /// Best vector similarity seen for this chunk (0 when graph-only).
    pub vector_score: f64,
    /// 0-based position in the vector result list, if vector-retrieved.
    pub vector_rank: Option<usize>,
    pub graph_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub anchor_entities: Vec<String>,
    pub source: CandidateSource,
}

impl SearchCandidate {
    pub fn vector(chunk_id: impl Into<String>, score: f64, rank: usize) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            vector_score: score,
            vector_rank: Some(rank),
            graph_score: 0.0,
            timestamp: None,
            anchor_entities: Vec::new(),
            source: CandidateSource::Vector,
        }
    }

    pub fn graph(chunk_id: impl Into<String>, score: f64) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            vector_score: 0.0,
            vector_rank: None,
            graph_score: score,
            timestamp: None,
            anchor_entities: Vec::new(),
            source: CandidateSource::Graph,
        }
    }
}

/// Per-signal contribution to a combined score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalBreakdown {
    /// Normalized signal values in [0, 1].
    pub vector: f64,
    pub graph: f64,
    pub recency: f64,
    /// Weighted contributions; these sum to `combined_score`.
    pub vector_contribution: f64,
    pub graph_contribution: f64,
    pub recency_contribution: f64,
}

/// A ranked chunk with explainable scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based position in the ranked output.
    pub rank: usize,
    pub chunk_id: String,
    pub vector_score: f64,
    pub graph_score: f64,
    pub combined_score: f64,
    pub anchor_entities: Vec<String>,
    pub breakdown: SignalBreakdown,
    pub source: CandidateSource,
}

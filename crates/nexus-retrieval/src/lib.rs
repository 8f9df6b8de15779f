//! # nexus-retrieval
//!
//! Hybrid search and result ranking.
//!
//! Stage 1: vector recall, anchor entities from the recalled chunks, one-hop
//! graph expansion, merge by chunk id.
//! Stage 2: max-normalized vector/graph/recency signals, weighted sum,
//! deterministic stable sort.

pub mod engine;
pub mod options;
pub mod ranking;
pub mod search;

pub use engine::{RetrievalEngine, SearchResponse};
pub use options::SearchOptions;
pub use ranking::merge::merge_candidate_lists;
pub use ranking::{rank_at, RankingEngine};
pub use search::{HybridSearch, SearchOutcome};

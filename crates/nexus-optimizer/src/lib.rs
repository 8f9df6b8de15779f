//! # nexus-optimizer
//!
//! Caches hybrid search and reasoning results by normalized query
//! signature. Entries expire by TTL and are dropped as soon as a graph
//! mutation touches one of their anchor ids.

pub mod cache;
pub mod optimizer;
pub mod signature;

pub use cache::CacheStats;
pub use optimizer::{Optimized, OptimizerStats, QueryOptimizer, QueryPlan};

//! # nexus-reasoning
//!
//! Multi-hop traversal between entities. Path confidence is the product of
//! traversed relationship confidences. Each path carries its own visited set,
//! and a global expansion budget bounds total work on any graph.

pub mod candidates;
pub mod engine;
pub mod explain;
pub mod options;
pub mod templates;
mod traversal;

pub use candidates::path_candidates;
pub use engine::ReasoningEngine;
pub use options::ReasoningOptions;

//! # nexus-pipeline
//!
//! Ingestion orchestration and the `KnowledgeEngine` facade.
//!
//! - `batch`: bounded rayon pool extracting chunks into the graph
//! - `incremental`: debounced file queue with a cancellable flush scheduler
//! - `engine`: wires every component behind the exposed operations

pub mod apply;
pub mod batch;
pub mod engine;
pub mod incremental;
pub mod observability;
pub mod result;

pub use apply::{apply_extraction, ApplyCounts};
pub use batch::BatchPipeline;
pub use engine::{Collaborators, KnowledgeEngine};
pub use incremental::{FlushReport, IncrementalIngestor};
pub use observability::init_tracing;
pub use result::{ChunkFailure, PipelineResult};

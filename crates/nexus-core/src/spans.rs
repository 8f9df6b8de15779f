//! Span definitions per operation: extraction, merge, search, reasoning, pipeline.
//!
//! Each span carries its identifying fields via the `tracing` crate.

/// Create an extraction span.
#[macro_export]
macro_rules! extraction_span {
    ($chunk_id:expr) => {
        tracing::debug_span!("nexus.extraction", chunk_id = %$chunk_id)
    };
}

/// Create a merge span.
#[macro_export]
macro_rules! merge_span {
    ($primary:expr, $count:expr) => {
        tracing::info_span!("nexus.merge", primary = %$primary, duplicates = $count)
    };
}

/// Create a hybrid search span.
#[macro_export]
macro_rules! search_span {
    ($limit:expr) => {
        tracing::info_span!("nexus.search", limit = $limit)
    };
}

/// Create a reasoning span.
#[macro_export]
macro_rules! reasoning_span {
    ($mode:expr, $starts:expr) => {
        tracing::info_span!("nexus.reasoning", mode = ?$mode, starts = $starts)
    };
}

/// Create a pipeline batch span.
#[macro_export]
macro_rules! pipeline_span {
    ($batch_size:expr) => {
        tracing::info_span!("nexus.pipeline", batch_size = $batch_size)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const EXTRACTION: &str = "nexus.extraction";
    pub const MERGE: &str = "nexus.merge";
    pub const SEARCH: &str = "nexus.search";
    pub const REASONING: &str = "nexus.reasoning";
    pub const PIPELINE: &str = "nexus.pipeline";
}

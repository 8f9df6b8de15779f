use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::apply::ApplyCounts;

/// A chunk that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub chunk_id: String,
    pub source_id: String,
    pub error: String,
}

/// Outcome of one ingest batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Chunks submitted.
    pub total_chunks: usize,
    /// Chunks extracted and written without error.
    pub processed_chunks: usize,
    pub entities_created: usize,
    pub entities_updated: usize,
    pub relationships_created: usize,
    pub relationships_updated: usize,
    pub processing_time: Duration,
    /// Sorted by chunk id.
    pub errors: Vec<ChunkFailure>,
}

impl PipelineResult {
    pub(crate) fn absorb(&mut self, counts: ApplyCounts) {
        self.entities_created += counts.entities_created;
        self.entities_updated += counts.entities_updated;
        self.relationships_created += counts.relationships_created;
        self.relationships_updated += counts.relationships_updated;
    }

    pub(crate) fn extend(&mut self, other: PipelineResult) {
        self.total_chunks += other.total_chunks;
        self.processed_chunks += other.processed_chunks;
        self.entities_created += other.entities_created;
        self.entities_updated += other.entities_updated;
        self.relationships_created += other.relationships_created;
        self.relationships_updated += other.relationships_updated;
        self.processing_time += other.processing_time;
        self.errors.extend(other.errors);
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Source ids of every failed chunk, deduplicated.
    pub fn failed_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self.errors.iter().map(|f| f.source_id.clone()).collect();
        sources.sort();
        sources.dedup();
        sources
    }
}

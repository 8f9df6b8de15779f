use serde::{Deserialize, Serialize};

use super::defaults;

/// Batch and incremental ingestion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker pool size for chunk extraction.
    pub max_concurrency: usize,
    /// Chunks admitted to the pool at once.
    pub queue_capacity: usize,
    /// Quiet period after the last enqueue before a scheduled flush.
    pub debounce_ms: u64,
    /// Scheduler tick interval.
    pub flush_interval_ms: u64,
    /// Attempts per queued file before it is dropped.
    pub max_file_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::DEFAULT_MAX_CONCURRENCY,
            queue_capacity: defaults::DEFAULT_QUEUE_CAPACITY,
            debounce_ms: defaults::DEFAULT_DEBOUNCE_MS,
            flush_interval_ms: defaults::DEFAULT_FLUSH_INTERVAL_MS,
            max_file_retries: defaults::DEFAULT_MAX_FILE_RETRIES,
        }
    }
}

/// Provenance tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    pub enabled: bool,
    pub max_retry_attempts: u32,
    pub retry_interval_ms: u64,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_PROVENANCE_ENABLED,
            max_retry_attempts: defaults::DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_interval_ms: defaults::DEFAULT_RETRY_INTERVAL_MS,
        }
    }
}

/// Per-chunk extraction failures. Non-fatal: callers log and skip the chunk.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("chunk {chunk_id} exceeds {max_chars} characters ({actual})")]
    ChunkTooLarge {
        chunk_id: String,
        max_chars: usize,
        actual: usize,
    },

    #[error("chunk id must not be empty")]
    EmptyChunkId,

    #[error("extractor failed on chunk {chunk_id}: {reason}")]
    ExtractorFailed { chunk_id: String, reason: String },
}

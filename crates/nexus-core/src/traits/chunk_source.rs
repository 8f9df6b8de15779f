use chrono::{DateTime, Utc};

use crate::errors::NexusResult;
use crate::models::{Chunk, ChunkFilter};

/// Read access to the persistent chunk store.
pub trait IChunkSource: Send + Sync {
    fn get_chunk_text(&self, chunk_id: &str) -> NexusResult<Option<String>>;

    fn get_chunks_by_filter(&self, filter: &ChunkFilter) -> NexusResult<Vec<Chunk>>;

    /// Creation time of a chunk, used for the recency ranking signal.
    fn chunk_timestamp(&self, _chunk_id: &str) -> NexusResult<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

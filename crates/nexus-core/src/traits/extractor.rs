use crate::errors::NexusResult;
use crate::models::{Chunk, ExtractionOutput};

/// Turns chunk text into candidate entities and relationships.
pub trait IEntityExtractor: Send + Sync {
    /// Extract from one chunk. An `Err` is a per-chunk failure; the
    /// pipeline records it and moves on.
    fn try_extract(&self, chunk: &Chunk) -> NexusResult<ExtractionOutput>;

    fn name(&self) -> &str;
}

use crate::errors::NexusResult;
use crate::models::ChunkFilter;

/// External vector-similarity search over chunk embeddings.
///
/// The sole external blocking dependency of the core; implementations must
/// bound their own latency.
pub trait IVectorSearch: Send + Sync {
    /// Top-`k` chunks for `embedding`, best first, as `(chunk_id, score)`.
    fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: &ChunkFilter,
    ) -> NexusResult<Vec<(String, f64)>>;
}

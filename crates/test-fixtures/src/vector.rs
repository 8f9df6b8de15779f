//! Brute-force in-memory vector search.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use nexus_core::errors::{NexusResult, SearchError};
use nexus_core::models::ChunkFilter;
use nexus_core::similarity::cosine_similarity;
use nexus_core::traits::IVectorSearch;

struct Indexed {
    chunk_id: String,
    source_id: String,
    embedding: Vec<f32>,
}

/// Cosine top-k over registered chunk embeddings. Can be switched offline
/// to simulate an unavailable vector store.
pub struct InMemoryVectorSearch {
    entries: RwLock<Vec<Indexed>>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryVectorSearch {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, chunk_id: &str, source_id: &str, embedding: Vec<f32>) {
        let mut entries = self.entries.write().unwrap();
        entries.retain(|e| e.chunk_id != chunk_id);
        entries.push(Indexed {
            chunk_id: chunk_id.to_string(),
            source_id: source_id.to_string(),
            embedding,
        });
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `search` calls served (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryVectorSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl IVectorSearch for InMemoryVectorSearch {
    fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: &ChunkFilter,
    ) -> NexusResult<Vec<(String, f64)>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(SearchError::VectorSearchUnavailable {
                reason: "in-memory index switched offline".into(),
            }
            .into());
        }
        let entries = self.entries.read().unwrap();
        let mut scored: Vec<(String, f64)> = entries
            .iter()
            .filter(|e| filter.source_ids.is_empty() || filter.source_ids.contains(&e.source_id))
            .filter(|e| filter.chunk_ids.is_empty() || filter.chunk_ids.contains(&e.chunk_id))
            .map(|e| (e.chunk_id.clone(), cosine_similarity(embedding, &e.embedding)))
            .filter(|(_, s)| *s > 0.0)
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }
}

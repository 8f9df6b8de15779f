//! In-memory chunk store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use nexus_core::errors::{NexusResult, PipelineError};
use nexus_core::models::{Chunk, ChunkFilter};
use nexus_core::traits::IChunkSource;

/// Chunks keyed by id, returned in id order.
#[derive(Default)]
pub struct InMemoryChunkSource {
    chunks: RwLock<BTreeMap<String, Chunk>>,
    offline: AtomicBool,
}

impl InMemoryChunkSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks(chunks: Vec<Chunk>) -> Self {
        let source = Self::new();
        for chunk in chunks {
            source.insert(chunk);
        }
        source
    }

    pub fn insert(&self, chunk: Chunk) {
        self.chunks.write().unwrap().insert(chunk.id.clone(), chunk);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> NexusResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PipelineError::ChunkSourceUnavailable {
                reason: "in-memory store switched offline".into(),
            }
            .into());
        }
        Ok(())
    }
}

impl IChunkSource for InMemoryChunkSource {
    fn get_chunk_text(&self, chunk_id: &str) -> NexusResult<Option<String>> {
        self.check()?;
        Ok(self.chunks.read().unwrap().get(chunk_id).map(|c| c.text.clone()))
    }

    fn get_chunks_by_filter(&self, filter: &ChunkFilter) -> NexusResult<Vec<Chunk>> {
        self.check()?;
        Ok(self
            .chunks
            .read()
            .unwrap()
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    fn chunk_timestamp(&self, chunk_id: &str) -> NexusResult<Option<DateTime<Utc>>> {
        self.check()?;
        Ok(self
            .chunks
            .read()
            .unwrap()
            .get(chunk_id)
            .and_then(|c| c.created_at))
    }
}

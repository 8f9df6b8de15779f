//! Batch ingestion: extract chunks on a bounded rayon pool and fold each
//! chunk's output into the graph.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use nexus_core::config::PipelineConfig;
use nexus_core::constants::MAX_INGEST_BATCH;
use nexus_core::errors::{NexusResult, PipelineError};
use nexus_core::models::{Chunk, ChunkFilter};
use nexus_core::pipeline_span;
use nexus_core::traits::{IChunkSource, IEntityExtractor};
use nexus_graph::GraphStore;

use crate::apply::{apply_extraction, ApplyCounts};
use crate::result::{ChunkFailure, PipelineResult};

pub struct BatchPipeline {
    extractor: Arc<dyn IEntityExtractor>,
    graph: Arc<GraphStore>,
    chunks: Option<Arc<dyn IChunkSource>>,
    pool: rayon::ThreadPool,
    config: PipelineConfig,
}

impl BatchPipeline {
    pub fn new(
        extractor: Arc<dyn IEntityExtractor>,
        graph: Arc<GraphStore>,
        config: PipelineConfig,
    ) -> NexusResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrency.max(1))
            .thread_name(|i| format!("nexus-ingest-{i}"))
            .build()
            .map_err(|e| PipelineError::WorkerPool {
                reason: e.to_string(),
            })?;
        Ok(Self {
            extractor,
            graph,
            chunks: None,
            pool,
            config,
        })
    }

    pub fn with_chunk_source(mut self, chunks: Arc<dyn IChunkSource>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    /// Extract and store every chunk. At most `queue_capacity` chunks are in
    /// flight at once. A failing chunk is recorded in `errors` and never
    /// aborts the batch. Repeated chunk ids are processed once.
    pub fn ingest_chunks(&self, chunks: &[Chunk]) -> NexusResult<PipelineResult> {
        if chunks.len() > MAX_INGEST_BATCH {
            return Err(PipelineError::BatchTooLarge {
                size: chunks.len(),
                max: MAX_INGEST_BATCH,
            }
            .into());
        }
        let span = pipeline_span!(chunks.len());
        let _guard = span.enter();
        let start = Instant::now();

        let mut seen = HashSet::with_capacity(chunks.len());
        let unique: Vec<&Chunk> = chunks.iter().filter(|c| seen.insert(c.id.as_str())).collect();

        let processed = AtomicUsize::new(0);
        let totals: Mutex<ApplyCounts> = Mutex::new(ApplyCounts::default());
        let errors: Mutex<Vec<ChunkFailure>> = Mutex::new(Vec::new());

        for window in unique.chunks(self.config.queue_capacity.max(1)) {
            self.pool.install(|| {
                window.par_iter().for_each(|chunk| match self.process_chunk(chunk) {
                    Ok(counts) => {
                        processed.fetch_add(1, Ordering::Relaxed);
                        totals
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .add(counts);
                    }
                    Err(error) => {
                        warn!(chunk_id = %chunk.id, error = %error, "chunk ingestion failed");
                        errors
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(ChunkFailure {
                                chunk_id: chunk.id.clone(),
                                source_id: chunk.source_id.clone(),
                                error,
                            });
                    }
                });
            });
        }

        let mut errors = errors.into_inner().unwrap_or_else(PoisonError::into_inner);
        errors.sort_by(|a, b| a.chunk_id.cmp(&b.chunk_id));
        let mut result = PipelineResult {
            total_chunks: unique.len(),
            processed_chunks: processed.into_inner(),
            processing_time: start.elapsed(),
            errors,
            ..PipelineResult::default()
        };
        result.absorb(totals.into_inner().unwrap_or_else(PoisonError::into_inner));

        info!(
            total = result.total_chunks,
            processed = result.processed_chunks,
            failed = result.errors.len(),
            entities_created = result.entities_created,
            relationships_created = result.relationships_created,
            elapsed_ms = result.processing_time.as_millis() as u64,
            "ingest batch complete"
        );
        Ok(result)
    }

    /// Ingest the chunks the configured chunk source returns for `filter`.
    /// An unreachable source fails the call.
    pub fn process_existing_chunks(&self, filter: &ChunkFilter) -> NexusResult<PipelineResult> {
        let source = self.chunks.as_ref().ok_or_else(|| PipelineError::ChunkSourceUnavailable {
            reason: "no chunk source configured".to_string(),
        })?;
        let chunks = source.get_chunks_by_filter(filter)?;
        let mut result = PipelineResult::default();
        for batch in chunks.chunks(MAX_INGEST_BATCH) {
            result.extend(self.ingest_chunks(batch)?);
        }
        Ok(result)
    }

    fn process_chunk(&self, chunk: &Chunk) -> Result<ApplyCounts, String> {
        let output = self.extractor.try_extract(chunk).map_err(|e| e.to_string())?;
        if let Some(error) = output.error {
            return Err(error);
        }
        apply_extraction(&self.graph, &output).map_err(|e| e.to_string())
    }
}

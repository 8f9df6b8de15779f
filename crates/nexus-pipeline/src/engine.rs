//! KnowledgeEngine: one handle over extraction, the graph, retrieval,
//! reasoning, the query cache, and provenance.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use nexus_core::errors::{NexusError, NexusResult, SearchError};
use nexus_core::models::provenance::components;
use nexus_core::models::{
    Chunk, ChunkFilter, ConsistencyReport, DerivationKind, Entity, EntityFilter, GraphStatistics,
    ProvenanceRecord, ReasoningResult, Relationship, RelationshipFilter,
};
use nexus_core::traits::{
    IChunkSource, IEmbeddingProvider, IEntityExtractor, IProvenanceSink, IProvenanceStore,
    IVectorSearch,
};
use nexus_core::{CancellationToken, NexusConfig};
use nexus_extraction::ExtractionEngine;
use nexus_graph::{DedupCandidate, GraphStore, MergeReport, SimilarNode};
use nexus_optimizer::signature::search_signature;
use nexus_optimizer::{Optimized, OptimizerStats, QueryOptimizer, QueryPlan};
use nexus_provenance::{MemoryProvenanceStore, ProvenanceTracker};
use nexus_reasoning::{path_candidates, ReasoningEngine, ReasoningOptions};
use nexus_retrieval::{HybridSearch, RankingEngine, RetrievalEngine, SearchOptions, SearchResponse};

use crate::batch::BatchPipeline;
use crate::incremental::IncrementalIngestor;
use crate::result::PipelineResult;

/// External capabilities the engine consumes.
pub struct Collaborators {
    pub vector_search: Arc<dyn IVectorSearch>,
    pub embedder: Arc<dyn IEmbeddingProvider>,
    pub chunk_source: Arc<dyn IChunkSource>,
    pub provenance_store: Arc<dyn IProvenanceStore>,
    /// Defaults to the pattern extractor built from the extraction config.
    pub extractor: Option<Arc<dyn IEntityExtractor>>,
}

impl Collaborators {
    pub fn new(
        vector_search: Arc<dyn IVectorSearch>,
        embedder: Arc<dyn IEmbeddingProvider>,
        chunk_source: Arc<dyn IChunkSource>,
    ) -> Self {
        Self {
            vector_search,
            embedder,
            chunk_source,
            provenance_store: Arc::new(MemoryProvenanceStore::new()),
            extractor: None,
        }
    }

    pub fn with_provenance_store(mut self, store: Arc<dyn IProvenanceStore>) -> Self {
        self.provenance_store = store;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn IEntityExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }
}

pub struct KnowledgeEngine {
    config: NexusConfig,
    graph: Arc<GraphStore>,
    provenance: Arc<ProvenanceTracker>,
    pipeline: Arc<BatchPipeline>,
    incremental: Arc<IncrementalIngestor>,
    optimizer: Arc<QueryOptimizer>,
    retrieval: Arc<RetrievalEngine>,
    reasoning: Arc<ReasoningEngine>,
    embedder: Arc<dyn IEmbeddingProvider>,
}

impl KnowledgeEngine {
    /// Validate `config` and wire every component. The query optimizer is
    /// registered as a graph observer so mutations invalidate cached results.
    pub fn new(config: NexusConfig, collaborators: Collaborators) -> NexusResult<Self> {
        config.validate()?;
        let Collaborators {
            vector_search,
            embedder,
            chunk_source,
            provenance_store,
            extractor,
        } = collaborators;

        let provenance = Arc::new(ProvenanceTracker::new(
            provenance_store,
            config.provenance.clone(),
        ));
        let graph = Arc::new(
            GraphStore::new(config.graph.clone())
                .with_embedder(Arc::clone(&embedder))
                .with_provenance(provenance.clone()),
        );

        let retrieval = Arc::new(
            RetrievalEngine::new(
                HybridSearch::new(vector_search, graph.clone(), config.search.clone()),
                RankingEngine::new(config.ranking.clone()),
            )
            .with_chunk_source(Arc::clone(&chunk_source)),
        );
        let reasoning = Arc::new(ReasoningEngine::new(config.reasoning.clone()));
        let optimizer = Arc::new(QueryOptimizer::new(
            Arc::clone(&retrieval),
            Arc::clone(&reasoning),
            graph.clone(),
            config.optimizer.clone(),
        ));
        graph.add_observer(optimizer.observer());

        let extractor = extractor.unwrap_or_else(|| {
            Arc::new(ExtractionEngine::new(config.extraction.clone())) as Arc<dyn IEntityExtractor>
        });
        let pipeline = Arc::new(
            BatchPipeline::new(extractor, Arc::clone(&graph), config.pipeline.clone())?
                .with_chunk_source(chunk_source),
        );
        let incremental = Arc::new(IncrementalIngestor::new(Arc::clone(&pipeline)));

        info!(
            version = nexus_core::constants::VERSION,
            embedder = embedder.name(),
            dimensions = embedder.dimensions(),
            max_concurrency = config.pipeline.max_concurrency,
            "knowledge engine ready"
        );
        Ok(Self {
            config,
            graph,
            provenance,
            pipeline,
            incremental,
            optimizer,
            retrieval,
            reasoning,
            embedder,
        })
    }

    pub fn config(&self) -> &NexusConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    // --- ingestion ---

    pub fn ingest_chunks(&self, chunks: &[Chunk]) -> NexusResult<PipelineResult> {
        self.pipeline.ingest_chunks(chunks)
    }

    /// Reprocess the stored chunks matching `filter`.
    pub fn process_existing_chunks(&self, filter: &ChunkFilter) -> NexusResult<PipelineResult> {
        self.pipeline.process_existing_chunks(filter)
    }

    /// The engine's debounced file queue. Every call returns the same
    /// queue, so files enqueued through one handle flush through any other.
    pub fn incremental(&self) -> Arc<IncrementalIngestor> {
        Arc::clone(&self.incremental)
    }

    // --- queries ---

    pub fn default_search_options(&self) -> SearchOptions {
        self.retrieval.default_options()
    }

    pub fn default_reasoning_options(&self) -> ReasoningOptions {
        self.reasoning.default_options()
    }

    /// Embed `query` and run a cached hybrid search.
    pub fn search(&self, query: &str, options: &SearchOptions) -> NexusResult<Optimized<SearchResponse>> {
        let embedding = self.embed_query(query)?;
        self.search_embedding(&embedding, options)
    }

    /// Search with the evidence chunks of `reasoning` merged in as graph
    /// candidates before ranking. Never cached.
    pub fn search_with_reasoning(
        &self,
        query: &str,
        options: &SearchOptions,
        reasoning: &ReasoningResult,
    ) -> NexusResult<SearchResponse> {
        let embedding = self.embed_query(query)?;
        let extra = path_candidates(&reasoning.paths);
        let answer = Optimized {
            value: self.retrieval.search_with(&embedding, options, &extra)?,
            plan: QueryPlan::Hybrid,
            signature: search_signature(&embedding, options, self.config.optimizer.embedding_precision),
        };
        self.record_search(&answer);
        Ok(answer.value)
    }

    fn embed_query(&self, query: &str) -> NexusResult<Vec<f32>> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery {
                reason: "query text is empty".to_string(),
            }
            .into());
        }
        self.embedder.embed(query).map_err(|e| match e {
            NexusError::SearchError(_) => e,
            other => SearchError::EmbeddingFailed {
                reason: other.to_string(),
            }
            .into(),
        })
    }

    pub fn search_embedding(
        &self,
        embedding: &[f32],
        options: &SearchOptions,
    ) -> NexusResult<Optimized<SearchResponse>> {
        let answer = self.optimizer.search(embedding, options)?;
        if answer.plan != QueryPlan::CacheHit {
            self.record_search(&answer);
        }
        Ok(answer)
    }

    /// Multi-hop reasoning from `start` entities, toward `targets` if any.
    pub fn reason(
        &self,
        start: &[String],
        targets: &[String],
        options: &ReasoningOptions,
    ) -> NexusResult<Optimized<ReasoningResult>> {
        let answer = self.optimizer.reason(start, targets, options)?;
        if answer.plan != QueryPlan::CacheHit {
            let inputs: Vec<String> = start.iter().chain(targets).cloned().collect();
            self.provenance.record(
                ProvenanceRecord::new(
                    &answer.signature,
                    DerivationKind::ReasoningDerivation,
                    inputs,
                    components::REASONING,
                )
                .with_detail("mode", format!("{:?}", answer.value.mode))
                .with_detail("paths", answer.value.paths.len().to_string())
                .with_detail("truncated", answer.value.truncated.to_string())
                .with_detail("nodes_expanded", answer.value.nodes_expanded.to_string()),
            );
        }
        Ok(answer)
    }

    /// One record for the query, plus one per ranked result naming the
    /// anchors that contributed to it.
    fn record_search(&self, answer: &Optimized<SearchResponse>) {
        let response = &answer.value;
        let chunk_ids: Vec<String> = response.results.iter().map(|r| r.chunk_id.clone()).collect();
        self.provenance.record(
            ProvenanceRecord::new(
                &answer.signature,
                DerivationKind::QueryDerivation,
                chunk_ids,
                components::SEARCH,
            )
            .with_detail("plan", format!("{:?}", answer.plan))
            .with_detail("degraded", response.degraded.to_string())
            .with_detail("total_candidates", response.total_candidates.to_string()),
        );
        for result in &response.results {
            self.provenance.record(
                ProvenanceRecord::new(
                    &result.chunk_id,
                    DerivationKind::QueryDerivation,
                    result.anchor_entities.clone(),
                    components::RANKING,
                )
                .with_detail("query", answer.signature.clone())
                .with_detail("rank", result.rank.to_string())
                .with_detail("combined_score", format!("{:.4}", result.combined_score)),
            );
        }
    }

    // --- graph ---

    pub fn get_entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        self.graph.get_entities(filter)
    }

    pub fn get_relationships(&self, filter: &RelationshipFilter) -> Vec<Relationship> {
        self.graph.get_relationships(filter)
    }

    pub fn find_similar_nodes(&self, entity_id: &str, threshold: f64) -> NexusResult<Vec<SimilarNode>> {
        self.graph.find_similar_nodes(entity_id, threshold)
    }

    pub fn merge_entities(&self, primary_id: &str, duplicate_ids: &[String]) -> NexusResult<MergeReport> {
        self.graph.merge_entities(primary_id, duplicate_ids)
    }

    pub fn dedup_candidates(&self) -> Vec<DedupCandidate> {
        self.graph.dedup_candidates()
    }

    pub fn resolve_candidate(&self, entity_id: &str, accept: bool) -> NexusResult<Option<MergeReport>> {
        self.graph.resolve_candidate(entity_id, accept)
    }

    pub fn get_statistics(&self) -> GraphStatistics {
        self.graph.get_statistics()
    }

    pub fn validate_consistency(&self) -> ConsistencyReport {
        self.graph.validate_consistency()
    }

    // --- provenance and housekeeping ---

    pub fn get_provenance_trail(&self, subject_id: &str) -> NexusResult<Vec<ProvenanceRecord>> {
        self.provenance.get_trail(subject_id)
    }

    pub fn cache_stats(&self) -> OptimizerStats {
        self.optimizer.stats()
    }

    /// Start the provenance retry worker. Must be called inside a tokio runtime.
    pub fn spawn_background(&self, token: CancellationToken) -> JoinHandle<()> {
        let interval = Duration::from_millis(self.config.provenance.retry_interval_ms.max(1));
        self.provenance.spawn_retry_worker(interval, token)
    }
}

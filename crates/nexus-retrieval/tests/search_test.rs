//! Hybrid search integration tests: expansion, cold graph, degradation.

use std::sync::Arc;

use nexus_core::config::{GraphConfig, RankingConfig, SearchConfig};
use nexus_core::errors::{GraphError, NexusResult, SearchError};
use nexus_core::models::{
    CandidateSource, Chunk, ChunkFilter, Entity, EntityType, ExtractionMethod, Mention,
    Relationship, RelationshipType, SearchCandidate,
};
use nexus_core::NexusError;
use nexus_graph::{GraphRead, GraphStore, Neighbor};
use nexus_retrieval::{HybridSearch, RankingEngine, RetrievalEngine, SearchOptions};
use test_fixtures::{InMemoryChunkSource, InMemoryVectorSearch};

const QUERY: [f32; 3] = [1.0, 0.0, 0.0];

fn index() -> Arc<InMemoryVectorSearch> {
    let vector = Arc::new(InMemoryVectorSearch::new());
    vector.insert("c1", "docs", vec![1.0, 0.0, 0.0]);
    vector.insert("c2", "docs", vec![0.9, 0.1, 0.0]);
    vector.insert("c3", "other", vec![0.0, 1.0, 0.0]);
    vector
}

/// Alice (c1) works at Acme Corp (c3).
fn graph() -> Arc<GraphStore> {
    let store = Arc::new(GraphStore::new(GraphConfig::default()));
    let alice = store
        .upsert_entity(
            Entity::new("Alice", EntityType::Person, 0.9)
                .with_mention(Mention::new("c1", 0, 5, ExtractionMethod::Pattern, 0.9)),
        )
        .unwrap()
        .id;
    let acme = store
        .upsert_entity(
            Entity::new("Acme Corp", EntityType::Organization, 0.9)
                .with_mention(Mention::new("c3", 0, 9, ExtractionMethod::Pattern, 0.9)),
        )
        .unwrap()
        .id;
    store
        .upsert_relationship(
            Relationship::new(&alice, &acme, RelationshipType::WorksAt, 0.9).with_evidence("c1"),
        )
        .unwrap();
    store
}

fn engine(vector: Arc<InMemoryVectorSearch>, graph: Arc<dyn GraphRead>) -> RetrievalEngine {
    RetrievalEngine::new(
        HybridSearch::new(vector, graph, SearchConfig::default()),
        RankingEngine::new(RankingConfig::default()),
    )
}

fn options() -> SearchOptions {
    SearchOptions {
        vector_k: 2,
        ..SearchOptions::default()
    }
}

fn ids(response: &nexus_retrieval::SearchResponse) -> Vec<&str> {
    response.results.iter().map(|r| r.chunk_id.as_str()).collect()
}

#[test]
fn expansion_surfaces_chunks_vector_search_missed() {
    let engine = engine(index(), graph());
    let response = engine.search(&QUERY, &options()).unwrap();

    assert!(!response.degraded);
    assert_eq!(response.anchors.len(), 1);
    assert_eq!(ids(&response), vec!["c1", "c2", "c3"]);

    let c1 = &response.results[0];
    assert_eq!(c1.source, CandidateSource::Both);
    assert!((c1.graph_score - 0.9).abs() < 1e-9);

    let c3 = &response.results[2];
    assert_eq!(c3.source, CandidateSource::Graph);
    assert_eq!(c3.vector_score, 0.0);
    assert!((c3.graph_score - 0.9 * 0.9 * 0.8).abs() < 1e-9);
    assert_eq!(c3.anchor_entities, response.anchors);
    assert_eq!(
        response.results.iter().map(|r| r.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn cold_graph_returns_pure_vector_ranking() {
    let empty = Arc::new(GraphStore::new(GraphConfig::default()));
    let engine = engine(index(), empty);
    let response = engine.search(&QUERY, &options()).unwrap();

    assert!(!response.degraded);
    assert!(response.anchors.is_empty());
    assert!(response.warnings.is_empty());
    assert_eq!(ids(&response), vec!["c1", "c2"]);
    for result in &response.results {
        assert_eq!(result.graph_score, 0.0);
        assert_eq!(result.source, CandidateSource::Vector);
    }
}

#[test]
fn disabling_expansion_keeps_only_vector_hits() {
    let engine = engine(index(), graph());
    let opts = SearchOptions {
        expand: false,
        ..options()
    };
    let response = engine.search(&QUERY, &opts).unwrap();
    assert_eq!(ids(&response), vec!["c1", "c2"]);
    assert!((response.results[0].graph_score - 0.9).abs() < 1e-9);
}

#[test]
fn entity_type_filter_limits_anchors() {
    let engine = engine(index(), graph());
    let opts = SearchOptions {
        entity_types: vec![EntityType::Organization],
        ..options()
    };
    let response = engine.search(&QUERY, &opts).unwrap();
    assert!(response.anchors.is_empty());
    assert_eq!(ids(&response), vec!["c1", "c2"]);
}

#[test]
fn source_filter_applies_to_expanded_chunks() {
    let chunks = Arc::new(InMemoryChunkSource::with_chunks(vec![
        Chunk::new("c1", "docs", "Alice works at Acme Corp."),
        Chunk::new("c2", "docs", "Alice again."),
        Chunk::new("c3", "other", "Acme Corp is large."),
    ]));
    let engine = engine(index(), graph()).with_chunk_source(chunks);
    let opts = options().with_filters(ChunkFilter::for_sources(vec!["docs".into()]));
    let response = engine.search(&QUERY, &opts).unwrap();
    assert_eq!(ids(&response), vec!["c1", "c2"]);
}

#[test]
fn limit_truncates_ranked_results() {
    let engine = engine(index(), graph());
    let response = engine.search(&QUERY, &options().with_limit(1)).unwrap();
    assert_eq!(ids(&response), vec!["c1"]);
    assert_eq!(response.total_candidates, 3);
}

#[test]
fn extra_candidates_are_merged_before_ranking() {
    let engine = engine(index(), graph());
    let mut from_path = SearchCandidate::graph("c2", 0.9);
    from_path.anchor_entities = vec!["path-entity".into()];
    let response = engine
        .search_with(&QUERY, &options(), &[from_path])
        .unwrap();
    let c2 = response.results.iter().find(|r| r.chunk_id == "c2").unwrap();
    assert_eq!(c2.source, CandidateSource::Both);
    assert!((c2.graph_score - 0.9).abs() < 1e-9);
}

struct Unavailable;

impl GraphRead for Unavailable {
    fn entities_in_chunk(&self, _: &str) -> NexusResult<Vec<Entity>> {
        Err(down())
    }
    fn neighbors(&self, _: &str) -> NexusResult<Vec<Neighbor>> {
        Err(down())
    }
    fn entity(&self, _: &str) -> NexusResult<Option<Entity>> {
        Err(down())
    }
}

fn down() -> NexusError {
    GraphError::GraphUnavailable {
        reason: "connection refused".into(),
    }
    .into()
}

#[test]
fn graph_outage_degrades_to_vector_only() {
    let engine = engine(index(), Arc::new(Unavailable));
    let response = engine.search(&QUERY, &options()).unwrap();
    assert!(response.degraded);
    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("vector-only"));
    assert_eq!(ids(&response), vec!["c1", "c2"]);
}

#[test]
fn vector_outage_fails_the_request() {
    let vector = index();
    vector.set_available(false);
    let engine = engine(vector, graph());
    let err = engine.search(&QUERY, &options()).unwrap_err();
    assert!(matches!(
        err,
        NexusError::SearchError(SearchError::VectorSearchUnavailable { .. })
    ));
}

#[test]
fn empty_embedding_is_invalid() {
    let engine = engine(index(), graph());
    let err = engine.search(&[], &options()).unwrap_err();
    assert!(matches!(
        err,
        NexusError::SearchError(SearchError::InvalidQuery { .. })
    ));
}

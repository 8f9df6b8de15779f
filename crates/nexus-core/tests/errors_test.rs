use nexus_core::errors::*;

#[test]
fn entity_not_found_carries_id() {
    let err: NexusError = GraphError::EntityNotFound {
        id: "abc-123".into(),
    }
    .into();
    assert!(err.to_string().contains("abc-123"));
}

#[test]
fn merge_conflict_is_detected() {
    let err: NexusError = GraphError::MergeConflict {
        entity_id: "e1".into(),
        attempts: 3,
    }
    .into();
    assert!(err.is_merge_conflict());
    assert!(!err.is_graph_unavailable());
    assert!(err.to_string().contains("3 attempts"));
}

#[test]
fn graph_unavailable_is_detected() {
    let err: NexusError = GraphError::GraphUnavailable {
        reason: "down".into(),
    }
    .into();
    assert!(err.is_graph_unavailable());
}

#[test]
fn chunk_too_large_carries_values() {
    let err = ExtractionError::ChunkTooLarge {
        chunk_id: "c9".into(),
        max_chars: 10,
        actual: 42,
    };
    let msg = err.to_string();
    assert!(msg.contains("c9"));
    assert!(msg.contains("10"));
    assert!(msg.contains("42"));
}

#[test]
fn vector_search_unavailable_wraps_into_search_error() {
    let err: NexusError = SearchError::VectorSearchUnavailable {
        reason: "timeout".into(),
    }
    .into();
    assert!(matches!(err, NexusError::SearchError(_)));
    assert!(err.to_string().contains("timeout"));
}

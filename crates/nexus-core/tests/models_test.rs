use nexus_core::models::*;

#[test]
fn entity_serializes_with_snake_case_fields() {
    let entity = Entity::new("Alice", EntityType::Person, 0.9)
        .with_mention(Mention::new("c1", 0, 5, ExtractionMethod::Pattern, 0.9));
    let json = serde_json::to_value(&entity).unwrap();
    assert_eq!(json["canonical_name"], "Alice");
    assert_eq!(json["entity_type"], "person");
    assert_eq!(json["mentions"][0]["chunk_id"], "c1");
    assert_eq!(json["mentions"][0]["method"], "pattern");
    assert!(json.get("merged_into").is_none());
}

#[test]
fn relationship_round_trips_through_json() {
    let rel = Relationship::new("a", "b", RelationshipType::WorksAt, 0.8).with_evidence("c1");
    let json = serde_json::to_string(&rel).unwrap();
    let back: Relationship = serde_json::from_str(&json).unwrap();
    assert_eq!(back.key(), rel.key());
    assert_eq!(back.evidence, vec!["c1".to_string()]);
}

#[test]
fn consistency_violation_is_tagged() {
    let v = ConsistencyViolation::SelfLoop {
        relationship_id: "r1".into(),
    };
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["kind"], "self_loop");
}

#[test]
fn reasoning_path_helpers() {
    let hop = |from: &str, to: &str, c: f64, ev: &str| Hop {
        from_entity_id: from.into(),
        from_name: from.into(),
        relationship_id: format!("{from}-{to}"),
        relationship_type: RelationshipType::RelatedTo,
        to_entity_id: to.into(),
        to_name: to.into(),
        edge_confidence: Confidence::new(c),
        cumulative_confidence: Confidence::new(c),
        inverse: false,
        evidence: vec![ev.into()],
    };
    let path = ReasoningPath {
        start_entity_id: "a".into(),
        hops: vec![hop("a", "b", 0.9, "c1"), hop("b", "c", 0.8, "c1")],
        confidence: Confidence::new(0.72),
        explanation: String::new(),
    };
    assert_eq!(path.depth(), 2);
    assert_eq!(path.end_entity_id(), "c");
    assert_eq!(path.entity_ids(), vec!["a", "b", "c"]);
    assert_eq!(path.evidence_chunks(), vec!["c1".to_string()]);
}

#[test]
fn chunk_filter_canonical_is_order_independent() {
    let a = ChunkFilter::for_sources(vec!["f2".into(), "f1".into()]);
    let b = ChunkFilter::for_sources(vec!["f1".into(), "f2".into()]);
    assert_eq!(a.canonical(), b.canonical());
}

//! Graph manager integration tests: idempotent upserts, dedup, merge, and
//! concurrent writers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

use nexus_core::config::GraphConfig;
use nexus_core::models::{
    DerivationKind, Entity, EntityFilter, EntityType, ExtractionMethod, Mention,
    ProvenanceRecord, Relationship, RelationshipFilter, RelationshipType,
};
use nexus_core::traits::{IGraphObserver, IProvenanceSink};
use nexus_graph::{GraphStore, UpsertAction};
use test_fixtures::FixedEmbedder;

fn mention(chunk: &str, start: usize, end: usize) -> Mention {
    Mention::new(chunk, start, end, ExtractionMethod::Pattern, 0.8)
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<ProvenanceRecord>>);

impl IProvenanceSink for RecordingSink {
    fn record(&self, record: ProvenanceRecord) {
        self.0.lock().unwrap().push(record);
    }
}

#[derive(Default)]
struct RecordingObserver(Mutex<Vec<String>>);

impl IGraphObserver for RecordingObserver {
    fn on_mutation(&self, affected_ids: &[String]) {
        self.0.lock().unwrap().extend(affected_ids.iter().cloned());
    }
}

fn ingest_alice_works_at_acme(store: &GraphStore, chunk: &str) {
    let alice = store
        .upsert_entity(
            Entity::new("Alice", EntityType::Person, 0.85).with_mention(mention(chunk, 0, 5)),
        )
        .unwrap()
        .id;
    let acme = store
        .upsert_entity(
            Entity::new("Acme Corp", EntityType::Organization, 0.85)
                .with_mention(mention(chunk, 15, 24)),
        )
        .unwrap()
        .id;
    store
        .upsert_relationship(
            Relationship::new(&alice, &acme, RelationshipType::WorksAt, 0.85).with_evidence(chunk),
        )
        .unwrap();
}

#[test]
fn ingesting_same_content_twice_is_idempotent() {
    let store = GraphStore::new(GraphConfig::default());
    ingest_alice_works_at_acme(&store, "c1");
    ingest_alice_works_at_acme(&store, "c1");

    let people = store.get_entities(&EntityFilter {
        name_contains: Some("alice".into()),
        ..Default::default()
    });
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].mention_count(), 2);
    let orgs = store.get_entities(&EntityFilter {
        entity_types: vec![EntityType::Organization],
        ..Default::default()
    });
    assert_eq!(orgs.len(), 1);

    let rels = store.get_relationships(&RelationshipFilter {
        relationship_types: vec![RelationshipType::WorksAt],
        ..Default::default()
    });
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].occurrences, 2);
    assert!(store.validate_consistency().is_consistent());
}

fn acme_embedder() -> Arc<FixedEmbedder> {
    let y = (1.0f32 - 0.92 * 0.92).sqrt();
    Arc::new(
        FixedEmbedder::new(2)
            .with("Acme Corp", vec![1.0, 0.0])
            .with("ACME Corporation", vec![0.92, y]),
    )
}

#[test]
fn embedding_similarity_auto_merges_on_upsert() {
    let store = GraphStore::new(GraphConfig {
        dedup_threshold: 0.85,
        auto_merge: true,
        ..GraphConfig::default()
    })
    .with_embedder(acme_embedder());

    let acme = store
        .upsert_entity(
            Entity::new("Acme Corp", EntityType::Organization, 0.9)
                .with_mention(mention("c1", 0, 9)),
        )
        .unwrap();
    let dup = store
        .upsert_entity(
            Entity::new("ACME Corporation", EntityType::Organization, 0.8)
                .with_mention(mention("c2", 0, 16)),
        )
        .unwrap();

    assert_eq!(
        dup.action,
        UpsertAction::Merged {
            into: acme.id.clone()
        }
    );
    let similarity = dup.similarity.unwrap();
    assert!((similarity - 0.92).abs() < 1e-3, "similarity {similarity}");
    assert_eq!(store.entity_count(), 1);

    let merged = store.get_entity(&acme.id).unwrap();
    assert!(merged.aliases.contains("ACME Corporation"));
    assert_eq!(merged.mention_count(), 2);
    assert!(store.find_similar_nodes(&acme.id, 0.0).unwrap().is_empty());
}

#[test]
fn flagged_candidate_merge_hides_duplicate_from_similar_nodes() {
    let sink = Arc::new(RecordingSink::default());
    let store = GraphStore::new(GraphConfig {
        dedup_threshold: 0.85,
        auto_merge: false,
        ..GraphConfig::default()
    })
    .with_embedder(acme_embedder())
    .with_provenance(sink.clone());

    let acme = store
        .upsert_entity(Entity::new("Acme Corp", EntityType::Organization, 0.9))
        .unwrap()
        .id;
    let dup = store
        .upsert_entity(Entity::new("ACME Corporation", EntityType::Organization, 0.8))
        .unwrap();
    assert_eq!(dup.action, UpsertAction::Created);

    let candidates = store.dedup_candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].entity_id, dup.id);
    assert_eq!(candidates[0].similar_to, acme);

    let similar = store.find_similar_nodes(&acme, 0.85).unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].entity_id, dup.id);

    let report = store.resolve_candidate(&dup.id, true).unwrap().unwrap();
    assert_eq!(report.merged_ids, vec![dup.id.clone()]);
    assert!(store.find_similar_nodes(&acme, 0.0).unwrap().is_empty());
    assert!(store.dedup_candidates().is_empty());

    let records = sink.0.lock().unwrap();
    assert!(records
        .iter()
        .any(|r| r.kind == DerivationKind::EntityMerged && r.subject_id == acme));
}

#[test]
fn rejected_candidate_keeps_both_entities() {
    let store = GraphStore::new(GraphConfig {
        auto_merge: false,
        ..GraphConfig::default()
    })
    .with_embedder(acme_embedder());
    store
        .upsert_entity(Entity::new("Acme Corp", EntityType::Organization, 0.9))
        .unwrap();
    let dup = store
        .upsert_entity(Entity::new("ACME Corporation", EntityType::Organization, 0.8))
        .unwrap();
    assert_eq!(store.resolve_candidate(&dup.id, false).unwrap(), None);
    assert_eq!(store.entity_count(), 2);
    assert!(store.resolve_candidate(&dup.id, false).is_err());
}

#[test]
fn merge_is_transitive() {
    let store = GraphStore::new(GraphConfig {
        auto_merge: false,
        ..GraphConfig::default()
    });
    let a = store
        .upsert_entity(Entity::new("Initech", EntityType::Organization, 0.7).with_mention(mention("c1", 0, 7)))
        .unwrap()
        .id;
    let b = store
        .upsert_entity(Entity::new("Globex", EntityType::Organization, 0.7).with_mention(mention("c2", 0, 6)))
        .unwrap()
        .id;
    let c = store
        .upsert_entity(Entity::new("Umbrella", EntityType::Organization, 0.7).with_mention(mention("c3", 0, 8)))
        .unwrap()
        .id;
    let bob = store
        .upsert_entity(Entity::new("Bob", EntityType::Person, 0.9))
        .unwrap()
        .id;
    store
        .upsert_relationship(Relationship::new(&bob, &a, RelationshipType::WorksAt, 0.8))
        .unwrap();

    store.merge_entities(&b, &[a.clone()]).unwrap();
    store.merge_entities(&c, &[b.clone()]).unwrap();

    assert_eq!(store.entity_count(), 2);
    assert_eq!(store.resolve_id(&a), Some(c.clone()));
    let survivor = store.get_entity(&c).unwrap();
    assert_eq!(survivor.chunk_ids().len(), 3);
    for alias in ["Initech", "Globex", "Umbrella"] {
        assert!(survivor.aliases.contains(alias));
    }

    let rels = store.get_relationships(&RelationshipFilter {
        entity_id: Some(a.clone()),
        ..Default::default()
    });
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].target_id, c);

    assert!(store.merge_entities(&c, &[a]).unwrap().is_noop());
    assert!(store.validate_consistency().is_consistent());
}

#[test]
fn neighbors_and_chunk_lookup_follow_merges() {
    let store = GraphStore::new(GraphConfig::default());
    ingest_alice_works_at_acme(&store, "c1");
    let alice = store.entities_in_chunk("c1");
    assert_eq!(alice.len(), 2);

    let alice_id = store
        .get_entities(&EntityFilter {
            entity_types: vec![EntityType::Person],
            ..Default::default()
        })
        .remove(0)
        .id;
    let neighbors = store.neighbors(&alice_id);
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].entity.canonical_name, "Acme Corp");
    assert!(neighbors[0].outgoing);
}

#[test]
fn observers_see_every_mutation() {
    let store = GraphStore::new(GraphConfig::default());
    let observer = Arc::new(RecordingObserver::default());
    store.add_observer(observer.clone());
    ingest_alice_works_at_acme(&store, "c1");
    let seen = observer.0.lock().unwrap();
    let rel = store.get_relationships(&RelationshipFilter::default()).remove(0);
    assert!(seen.contains(&rel.id));
    assert!(seen.contains(&rel.source_id));
}

#[test]
fn concurrent_upserts_of_same_name_create_one_entity() {
    let store = Arc::new(GraphStore::new(GraphConfig::default()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut ids = HashSet::new();
                for j in 0..25 {
                    let chunk = format!("c{i}-{j}");
                    let outcome = store
                        .upsert_entity(
                            Entity::new("Alice", EntityType::Person, 0.8)
                                .with_mention(mention(&chunk, 0, 5)),
                        )
                        .unwrap();
                    ids.insert(outcome.id);
                }
                ids
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.extend(handle.join().unwrap());
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(store.entity_count(), 1);
    let alice = store.get_entity(ids.iter().next().unwrap()).unwrap();
    assert_eq!(alice.mention_count(), 200);
}

#[test]
fn concurrent_merges_and_relationship_upserts_stay_consistent() {
    let store = Arc::new(GraphStore::new(GraphConfig {
        auto_merge: false,
        ..GraphConfig::default()
    }));
    let hub = store
        .upsert_entity(Entity::new("Hub", EntityType::Organization, 0.9))
        .unwrap()
        .id;
    let spokes: Vec<String> = (0..20)
        .map(|i| {
            store
                .upsert_entity(Entity::new(format!("Spoke {i:02}"), EntityType::Person, 0.8))
                .unwrap()
                .id
        })
        .collect();

    let writer = {
        let store = Arc::clone(&store);
        let hub = hub.clone();
        let spokes = spokes.clone();
        thread::spawn(move || {
            for spoke in &spokes {
                store
                    .upsert_relationship(Relationship::new(spoke, &hub, RelationshipType::WorksAt, 0.7))
                    .unwrap();
            }
        })
    };
    let merger = {
        let store = Arc::clone(&store);
        let spokes = spokes.clone();
        thread::spawn(move || {
            for pair in spokes.chunks(2) {
                store.merge_entities(&pair[0], &pair[1..]).unwrap();
            }
        })
    };
    writer.join().unwrap();
    merger.join().unwrap();

    assert_eq!(store.entity_count(), 11);
    let report = store.validate_consistency();
    assert!(report.is_consistent(), "{:?}", report.violations);
    for rel in store.get_relationships(&RelationshipFilter::default()) {
        assert!(store.get_entity(&rel.source_id).unwrap().is_active());
        assert!(store.get_entity(&rel.target_id).unwrap().is_active());
    }
}

//! GraphStore: the concurrent entity/relationship arena and its indexes.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tracing::warn;

use nexus_core::config::GraphConfig;
use nexus_core::errors::{GraphError, NexusResult};
use nexus_core::models::{
    Entity, EntityFilter, EntityType, ProvenanceRecord, Relationship, RelationshipFilter,
    RelationshipKey,
};
use nexus_core::traits::{IEmbeddingProvider, IGraphObserver, IProvenanceSink};

use crate::dedup::DedupCandidate;
use crate::locks::StripedLocks;
use crate::read::Neighbor;

/// Longest redirect chain followed before giving up.
const MAX_REDIRECT_HOPS: usize = 64;

/// Knowledge graph store.
pub struct GraphStore {
    pub(crate) config: GraphConfig,
    pub(crate) entities: DashMap<String, Entity>,
    pub(crate) relationships: DashMap<String, Relationship>,
    /// Idempotence index: relationship key -> relationship id.
    pub(crate) rel_index: DashMap<RelationshipKey, String>,
    /// Entity id -> ids of relationships touching it.
    pub(crate) adjacency: DashMap<String, BTreeSet<String>>,
    /// Normalized alias -> active entity ids carrying it.
    pub(crate) name_index: DashMap<String, BTreeSet<String>>,
    pub(crate) type_index: DashMap<EntityType, BTreeSet<String>>,
    /// Chunk id -> active entity ids mentioned in it.
    pub(crate) chunk_index: DashMap<String, BTreeSet<String>>,
    /// Pending dedup candidates keyed by the newer entity id.
    pub(crate) candidates: DashMap<String, DedupCandidate>,
    /// Serializes creation of same-named entities.
    pub(crate) name_locks: StripedLocks,
    /// Serializes mutations of the same entity.
    pub(crate) entity_locks: StripedLocks,
    pub(crate) embedder: Option<Arc<dyn IEmbeddingProvider>>,
    provenance: Option<Arc<dyn IProvenanceSink>>,
    observers: RwLock<Vec<Arc<dyn IGraphObserver>>>,
}

impl GraphStore {
    pub fn new(config: GraphConfig) -> Self {
        let stripes = config.lock_stripes;
        Self {
            config,
            entities: DashMap::new(),
            relationships: DashMap::new(),
            rel_index: DashMap::new(),
            adjacency: DashMap::new(),
            name_index: DashMap::new(),
            type_index: DashMap::new(),
            chunk_index: DashMap::new(),
            candidates: DashMap::new(),
            name_locks: StripedLocks::new(stripes),
            entity_locks: StripedLocks::new(stripes),
            embedder: None,
            provenance: None,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Embed names of incoming entities that carry no embedding.
    pub fn with_embedder(mut self, embedder: Arc<dyn IEmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_provenance(mut self, sink: Arc<dyn IProvenanceSink>) -> Self {
        self.provenance = Some(sink);
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Register an observer notified after every committed mutation.
    pub fn add_observer(&self, observer: Arc<dyn IGraphObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub(crate) fn notify(&self, affected: &[String]) {
        if affected.is_empty() {
            return;
        }
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer.on_mutation(affected);
        }
    }

    pub(crate) fn record(&self, record: ProvenanceRecord) {
        if let Some(sink) = &self.provenance {
            sink.record(record);
        }
    }

    // ── Id resolution ──────────────────────────────────────────────────────

    /// Follow merge redirects from `id` to the surviving entity id.
    /// `None` if `id` is unknown or the chain is broken.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        let mut current = id.to_string();
        for _ in 0..MAX_REDIRECT_HOPS {
            let next = {
                let entity = self.entities.get(&current)?;
                entity.merged_into.clone()
            };
            match next {
                Some(next) => current = next,
                None => return Some(current),
            }
        }
        warn!(id, "redirect chain exceeds hop limit");
        None
    }

    /// Resolve `id` or fail with `EntityNotFound`.
    pub(crate) fn require_active(&self, id: &str) -> NexusResult<String> {
        self.resolve_id(id).ok_or_else(|| {
            GraphError::EntityNotFound { id: id.to_string() }.into()
        })
    }

    pub(crate) fn is_active(&self, id: &str) -> bool {
        self.entities
            .get(id)
            .map(|e| e.is_active())
            .unwrap_or(false)
    }

    // ── Reads ──────────────────────────────────────────────────────────────

    /// The entity stored under `id`, tombstones included.
    pub fn get_entity(&self, id: &str) -> Option<Entity> {
        self.entities.get(id).map(|e| e.clone())
    }

    /// The surviving entity for `id`, following merge redirects.
    pub fn get_active_entity(&self, id: &str) -> Option<Entity> {
        let resolved = self.resolve_id(id)?;
        self.get_entity(&resolved)
    }

    pub fn get_relationship(&self, id: &str) -> Option<Relationship> {
        self.relationships.get(id).map(|r| r.clone())
    }

    /// Entities matching `filter`, ordered by canonical name then id.
    pub fn get_entities(&self, filter: &EntityFilter) -> Vec<Entity> {
        let mut out: Vec<Entity> = self
            .entities
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| {
            a.canonical_name
                .to_lowercase()
                .cmp(&b.canonical_name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        out
    }

    /// Relationships matching `filter`. Entity ids in the filter are
    /// resolved through merge redirects first.
    pub fn get_relationships(&self, filter: &RelationshipFilter) -> Vec<Relationship> {
        let resolve = |id: &Option<String>| {
            id.as_ref()
                .map(|i| self.resolve_id(i).unwrap_or_else(|| i.clone()))
        };
        let filter = RelationshipFilter {
            entity_id: resolve(&filter.entity_id),
            source_id: resolve(&filter.source_id),
            target_id: resolve(&filter.target_id),
            ..filter.clone()
        };

        let mut out: Vec<Relationship> = match &filter.entity_id {
            Some(id) => self
                .relationship_ids_of(id)
                .into_iter()
                .filter_map(|rid| self.get_relationship(&rid))
                .filter(|r| filter.matches(r))
                .collect(),
            None => self
                .relationships
                .iter()
                .filter(|r| filter.matches(r.value()))
                .map(|r| r.value().clone())
                .collect(),
        };
        out.sort_by(|a, b| {
            (&a.source_id, &a.target_id, a.relationship_type, &a.id).cmp(&(
                &b.source_id,
                &b.target_id,
                b.relationship_type,
                &b.id,
            ))
        });
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        out
    }

    pub(crate) fn relationship_ids_of(&self, entity_id: &str) -> BTreeSet<String> {
        self.adjacency
            .get(entity_id)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    /// Entities one hop from `entity_id`, each with the connecting
    /// relationship. The far endpoint is resolved through merge redirects,
    /// so a relationship is never returned without its entity.
    pub fn neighbors(&self, entity_id: &str) -> Vec<Neighbor> {
        let Some(id) = self.resolve_id(entity_id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for rel_id in self.relationship_ids_of(&id) {
            let Some(rel) = self.get_relationship(&rel_id) else {
                continue;
            };
            let outgoing = rel.source_id == id;
            let Some(other) = rel.other_endpoint(&id).map(str::to_string) else {
                continue;
            };
            let Some(entity) = self.get_active_entity(&other) else {
                continue;
            };
            if entity.id == id {
                continue;
            }
            out.push(Neighbor {
                relationship: rel,
                entity,
                outgoing,
            });
        }
        out
    }

    /// Active entities mentioned in `chunk_id`.
    pub fn entities_in_chunk(&self, chunk_id: &str) -> Vec<Entity> {
        let ids = self
            .chunk_index
            .get(chunk_id)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        let mut out: Vec<Entity> = ids
            .iter()
            .filter_map(|id| self.get_active_entity(id))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out.dedup_by(|a, b| a.id == b.id);
        out
    }

    pub fn entity_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_active()).count()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    // ── Index maintenance ──────────────────────────────────────────────────

    pub(crate) fn index_entity(&self, entity: &Entity) {
        for alias in entity.normalized_aliases() {
            if alias.is_empty() {
                continue;
            }
            self.name_index
                .entry(alias)
                .or_default()
                .insert(entity.id.clone());
        }
        self.type_index
            .entry(entity.entity_type)
            .or_default()
            .insert(entity.id.clone());
        for chunk_id in entity.chunk_ids() {
            self.chunk_index
                .entry(chunk_id)
                .or_default()
                .insert(entity.id.clone());
        }
    }

    pub(crate) fn unindex_entity(&self, entity: &Entity) {
        for alias in entity.normalized_aliases() {
            if let Some(mut ids) = self.name_index.get_mut(&alias) {
                ids.remove(&entity.id);
            }
        }
        if let Some(mut ids) = self.type_index.get_mut(&entity.entity_type) {
            ids.remove(&entity.id);
        }
        for chunk_id in entity.chunk_ids() {
            if let Some(mut ids) = self.chunk_index.get_mut(&chunk_id) {
                ids.remove(&entity.id);
            }
        }
    }

    pub(crate) fn retype(&self, id: &str, from: EntityType, to: EntityType) {
        if let Some(mut ids) = self.type_index.get_mut(&from) {
            ids.remove(id);
        }
        self.type_index.entry(to).or_default().insert(id.to_string());
    }
}

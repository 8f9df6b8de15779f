//! Read-side seam consumed by search and reasoning.

use serde::{Deserialize, Serialize};

use nexus_core::errors::NexusResult;
use nexus_core::models::{Entity, Relationship};

use crate::store::GraphStore;

/// One hop from an entity: the connecting relationship and the entity on
/// the other end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub relationship: Relationship,
    pub entity: Entity,
    /// True when the relationship points away from the queried entity.
    pub outgoing: bool,
}

/// Graph reads used by hybrid search and multi-hop reasoning.
///
/// Reads are fallible so a remote or degraded graph can report
/// `GraphUnavailable` and let search fall back to vector-only results.
pub trait GraphRead: Send + Sync {
    fn entities_in_chunk(&self, chunk_id: &str) -> NexusResult<Vec<Entity>>;

    fn neighbors(&self, entity_id: &str) -> NexusResult<Vec<Neighbor>>;

    /// The surviving entity for `entity_id`, following merge redirects.
    fn entity(&self, entity_id: &str) -> NexusResult<Option<Entity>>;

    /// Whether the graph holds no active entities. Used for query planning;
    /// implementations that cannot tell cheaply report `false`.
    fn is_empty(&self) -> NexusResult<bool> {
        Ok(false)
    }
}

impl GraphRead for GraphStore {
    fn entities_in_chunk(&self, chunk_id: &str) -> NexusResult<Vec<Entity>> {
        Ok(GraphStore::entities_in_chunk(self, chunk_id))
    }

    fn neighbors(&self, entity_id: &str) -> NexusResult<Vec<Neighbor>> {
        Ok(GraphStore::neighbors(self, entity_id))
    }

    fn entity(&self, entity_id: &str) -> NexusResult<Option<Entity>> {
        Ok(self.get_active_entity(entity_id))
    }

    fn is_empty(&self) -> NexusResult<bool> {
        Ok(self.entity_count() == 0)
    }
}

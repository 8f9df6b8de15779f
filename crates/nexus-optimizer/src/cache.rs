//! TTL cache keyed by query signature, with an anchor index for
//! mutation-driven invalidation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::notification::RemovalCause;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};

/// Anchor key for entries that must be dropped on any graph mutation.
const ANY_MUTATION: &str = "*";

/// Anchor id to the signatures depending on it, each tagged with the id of
/// the insert that created the link.
type AnchorIndex = DashMap<String, HashMap<String, u64>>;

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    /// Entries dropped because a mutation touched one of their anchors.
    pub invalidations: u64,
    /// Results not cached because the graph changed while they were computed.
    pub stale_skips: u64,
    pub entries: u64,
}

/// Opaque marker of the graph state a result was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

#[derive(Clone)]
struct Cached<V> {
    value: V,
    anchors: Arc<[String]>,
    insert_id: u64,
}

pub(crate) struct QueryCache<V> {
    entries: Cache<String, Cached<V>>,
    anchors: Arc<AnchorIndex>,
    next_insert_id: AtomicU64,
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    invalidations: AtomicU64,
    stale_skips: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> QueryCache<V> {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let anchors: Arc<AnchorIndex> = Arc::new(DashMap::new());
        let index = Arc::clone(&anchors);
        // Every removal (expiry, capacity, replacement, invalidation) unlinks
        // the removed entry from the anchor index.
        let listener = move |signature: Arc<String>, entry: Cached<V>, _cause: RemovalCause| {
            for anchor in entry.anchors.iter() {
                unlink(&index, anchor, &signature, entry.insert_id);
            }
        };
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .eviction_listener(listener)
                .build(),
            anchors,
            next_insert_id: AtomicU64::new(1),
            epoch: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            stale_skips: AtomicU64::new(0),
        }
    }

    pub fn get(&self, signature: &str) -> Option<V> {
        let found = self.entries.get(signature).map(|cached| cached.value);
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Lookup without touching the counters.
    pub fn contains(&self, signature: &str) -> bool {
        self.entries.contains_key(signature)
    }

    /// Capture before computing a result that will be inserted.
    pub fn epoch(&self) -> Epoch {
        Epoch(self.epoch.load(Ordering::Acquire))
    }

    /// Cache `value` under `signature`, indexed by `anchors`. An empty anchor
    /// set registers the entry for invalidation on any mutation. Skipped
    /// when any mutation happened since `computed_at`.
    pub fn insert(&self, signature: String, value: V, anchors: &[String], computed_at: Epoch) -> bool {
        let insert_id = self.next_insert_id.fetch_add(1, Ordering::Relaxed);
        let keys: Arc<[String]> = anchors_or_any(anchors)
            .into_iter()
            .map(str::to_string)
            .collect();
        for anchor in keys.iter() {
            self.anchors
                .entry(anchor.clone())
                .or_default()
                .insert(signature.clone(), insert_id);
        }
        self.entries.insert(
            signature.clone(),
            Cached {
                value,
                anchors: keys,
                insert_id,
            },
        );
        if self.epoch() != computed_at {
            // A concurrent invalidation may have missed the entry above.
            self.entries.invalidate(&signature);
            self.stale_skips.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.inserts.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Drop every entry anchored on any of `ids`, plus every entry that
    /// depends on any mutation. Returns the number of signatures dropped.
    pub fn invalidate(&self, ids: &[String]) -> usize {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let mut dropped: HashSet<String> = HashSet::new();
        for id in ids.iter().map(String::as_str).chain([ANY_MUTATION]) {
            if let Some((_, signatures)) = self.anchors.remove(id) {
                dropped.extend(signatures.into_keys());
            }
        }
        let removed = dropped
            .iter()
            .filter(|signature| self.entries.remove(*signature).is_some())
            .count();
        self.invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.invalidate_all();
        self.anchors.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            stale_skips: self.stale_skips.load(Ordering::Relaxed),
            entries: self.entries.entry_count(),
        }
    }

    /// Anchor-to-signature links currently held by the index.
    pub(crate) fn indexed_links(&self) -> usize {
        self.anchors.iter().map(|links| links.len()).sum()
    }
}

/// Remove the `signature` link under `anchor` if it still belongs to the
/// insert `insert_id`, dropping the anchor once nothing depends on it.
fn unlink(index: &AnchorIndex, anchor: &str, signature: &str, insert_id: u64) {
    if let Some(mut links) = index.get_mut(anchor) {
        if links.get(signature) == Some(&insert_id) {
            links.remove(signature);
        }
    }
    index.remove_if(anchor, |_, links| links.is_empty());
}

fn anchors_or_any(anchors: &[String]) -> Vec<&str> {
    if anchors.is_empty() {
        vec![ANY_MUTATION]
    } else {
        anchors.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> QueryCache<u32> {
        QueryCache::new(100, Duration::from_secs(60))
    }

    #[test]
    fn hit_and_miss_are_counted() {
        let c = cache();
        assert_eq!(c.get("q"), None);
        assert!(c.insert("q".into(), 7, &["e1".into()], c.epoch()));
        assert_eq!(c.get("q"), Some(7));
        let stats = c.stats();
        assert_eq!((stats.hits, stats.misses, stats.inserts), (1, 1, 1));
    }

    #[test]
    fn mutation_of_an_anchor_drops_the_entry() {
        let c = cache();
        c.insert("q1".into(), 1, &["e1".into(), "e2".into()], c.epoch());
        c.insert("q2".into(), 2, &["e3".into()], c.epoch());
        assert_eq!(c.invalidate(&["e2".into()]), 1);
        assert_eq!(c.get("q1"), None);
        assert_eq!(c.get("q2"), Some(2));
    }

    #[test]
    fn anchorless_entries_drop_on_any_mutation() {
        let c = cache();
        c.insert("cold".into(), 1, &[], c.epoch());
        assert_eq!(c.invalidate(&["unrelated".into()]), 1);
        assert_eq!(c.get("cold"), None);
    }

    #[test]
    fn result_computed_before_a_mutation_is_not_cached() {
        let c = cache();
        let before = c.epoch();
        c.invalidate(&["e1".into()]);
        assert!(!c.insert("q".into(), 1, &["e9".into()], before));
        assert_eq!(c.get("q"), None);
        assert_eq!(c.stats().stale_skips, 1);
    }

    #[test]
    fn expired_entries_leave_the_anchor_index() {
        let c: QueryCache<u32> = QueryCache::new(10, Duration::from_millis(1));
        for i in 0..200 {
            c.insert(format!("q{i}"), i, &[format!("e{i}"), "shared".into()], c.epoch());
        }
        c.insert("cold".into(), 0, &[], c.epoch());
        std::thread::sleep(Duration::from_millis(20));
        c.entries.run_pending_tasks();

        assert_eq!(c.stats().entries, 0);
        assert_eq!(c.indexed_links(), 0);
        assert!(c.anchors.is_empty());
    }

    #[test]
    fn replacing_an_entry_keeps_only_its_new_anchors() {
        let c = cache();
        c.insert("q".into(), 1, &["old".into()], c.epoch());
        c.insert("q".into(), 2, &["new".into()], c.epoch());
        c.stats();

        assert_eq!(c.indexed_links(), 1);
        assert_eq!(c.invalidate(&["old".into()]), 0);
        assert_eq!(c.get("q"), Some(2));
        assert_eq!(c.invalidate(&["new".into()]), 1);
        assert_eq!(c.indexed_links(), 0);
    }
}

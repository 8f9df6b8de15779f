//! Striped mutexes serializing mutations on the same key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A fixed array of mutexes addressed by key hash.
///
/// `lock_many` acquires every stripe it needs in ascending index order, so
/// two callers locking overlapping key sets cannot deadlock. Callers must not
/// acquire further stripes from the same set while holding guards.
pub struct StripedLocks {
    stripes: Vec<Mutex<()>>,
}

impl StripedLocks {
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn stripe_of(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    pub fn lock_one(&self, key: &str) -> MutexGuard<'_, ()> {
        self.lock_index(self.stripe_of(key))
    }

    pub fn lock_many<'k, I>(&self, keys: I) -> Vec<MutexGuard<'_, ()>>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let mut indices: Vec<usize> = keys.into_iter().map(|k| self.stripe_of(k)).collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(|i| self.lock_index(i)).collect()
    }

    fn lock_index(&self, index: usize) -> MutexGuard<'_, ()> {
        // Stripes guard no data of their own; poisoning carries no meaning.
        self.stripes[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.stripes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stripes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn overlapping_key_sets_do_not_deadlock() {
        let locks = Arc::new(StripedLocks::new(4));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let locks = Arc::clone(&locks);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let keys = if i % 2 == 0 { ["a", "b", "c"] } else { ["c", "b", "a"] };
                        let _g = locks.lock_many(keys);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn duplicate_stripes_are_locked_once() {
        let locks = StripedLocks::new(1);
        let guards = locks.lock_many(["x", "y", "z"]);
        assert_eq!(guards.len(), 1);
    }
}

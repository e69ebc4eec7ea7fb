//! Lookup maps split into independently locked shards.

use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock};

use rustc_hash::{FxHashMap, FxHasher};

const SHARD_COUNT: usize = 32;

/// Key → element index map. Lookups take one shard's read lock; inserts
/// re-check under that shard's write lock before creating anything.
#[derive(Debug)]
pub(crate) struct ShardedMap<K> {
    shards: Box<[RwLock<FxHashMap<K, u32>>]>,
}

impl<K: Hash + Eq + Copy> ShardedMap<K> {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT)
                .map(|_| RwLock::new(FxHashMap::default()))
                .collect(),
        }
    }

    #[inline]
    fn shard_of(key: &K) -> usize {
        let mut h = FxHasher::default();
        key.hash(&mut h);
        // Fx mixes into the high bits.
        (h.finish() >> 59) as usize % SHARD_COUNT
    }

    pub fn get(&self, key: &K) -> Option<u32> {
        self.shards[Self::shard_of(key)]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Return the index stored for `key`, creating it with `create` on a miss.
    ///
    /// The flag is true if this call created the entry. `create` runs under
    /// the shard write lock, so it is called at most once per key.
    pub fn get_or_insert_with(&self, key: K, create: impl FnOnce() -> u32) -> (u32, bool) {
        if let Some(index) = self.get(&key) {
            return (index, false);
        }
        let mut shard = self.shards[Self::shard_of(&key)]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(&index) = shard.get(&key) {
            return (index, false);
        }
        let index = create();
        shard.insert(key, index);
        (index, true)
    }

    /// Lock-free variant of [`get_or_insert_with`](Self::get_or_insert_with).
    pub fn get_or_insert_with_mut(
        &mut self,
        key: K,
        create: impl FnOnce() -> u32,
    ) -> (u32, bool) {
        let shard = self.shards[Self::shard_of(&key)]
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(&index) = shard.get(&key) {
            return (index, false);
        }
        let index = create();
        shard.insert(key, index);
        (index, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_insert_once() {
        let map: ShardedMap<u64> = ShardedMap::new();
        assert_eq!(map.get_or_insert_with(7, || 0), (0, true));
        assert_eq!(map.get_or_insert_with(7, || 1), (0, false));
        assert_eq!(map.get(&7), Some(0));
        assert_eq!(map.get(&8), None);
    }

    #[test]
    fn test_concurrent_creates_once_per_key() {
        let map: ShardedMap<u64> = ShardedMap::new();
        let created = AtomicU32::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for key in 0..200u64 {
                        map.get_or_insert_with(key, || created.fetch_add(1, Ordering::Relaxed));
                    }
                });
            }
        });
        assert_eq!(created.load(Ordering::Relaxed), 200);
        let mut indices: Vec<u32> = (0..200u64).filter_map(|k| map.get(&k)).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..200).collect::<Vec<u32>>());
    }
}

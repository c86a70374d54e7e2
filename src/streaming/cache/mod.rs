// src/streaming/cache/mod.rs
// Resident chunk table + its recency order. Guarded as one unit by the store lock.

mod lru;

use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use crate::streaming::types::ChunkKey;

pub use lru::RecencyQueue;

pub struct ResidentStore<D> {
    chunks: HashMap<ChunkKey, Arc<D>>,
    recency: RecencyQueue,
    // consecutive eviction candidates that turned out to be visible
    retained_streak: usize,
}

impl<D> Default for ResidentStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> ResidentStore<D> {
    pub fn new() -> Self {
        Self { chunks: HashMap::default(), recency: RecencyQueue::new(), retained_streak: 0 }
    }

    pub fn stats(&self) -> (usize, usize) {
        (self.chunks.len(), self.recency.len())
    }

    #[inline]
    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.chunks.contains_key(key)
    }

    /// Read access. A hit extends the chunk's lease on residency.
    pub fn get_touch(&mut self, key: ChunkKey) -> Option<Arc<D>> {
        let data = self.chunks.get(&key).cloned()?;
        self.recency.touch(key);
        Some(data)
    }

    /// First-seen insertion counts as an access.
    pub fn put(&mut self, key: ChunkKey, data: Arc<D>) {
        self.chunks.insert(key, data);
        self.recency.touch(key);
    }

    pub fn pop_oldest(&mut self) -> Option<ChunkKey> {
        self.recency.pop_oldest().map(|(k, _)| k)
    }

    /// Re-stamps a candidate that is still visible. Returns true once every
    /// entry has been re-stamped in a row, i.e. nothing is evictable right now.
    pub fn retain(&mut self, key: ChunkKey) -> bool {
        self.recency.touch(key);
        self.retained_streak += 1;
        self.retained_streak >= self.recency.len()
    }

    pub fn reset_streak(&mut self) {
        self.retained_streak = 0;
    }

    pub fn remove(&mut self, key: &ChunkKey) -> Option<Arc<D>> {
        self.recency.remove(key);
        self.retained_streak = 0;
        self.chunks.remove(key)
    }
}

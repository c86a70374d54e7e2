// src/streaming/cache/lru.rs
use std::collections::VecDeque;

use rustc_hash::FxHashMap as HashMap;

use crate::streaming::types::ChunkKey;

/// Oldest-first queue of chunk keys. A key's live stamp lives in `stamps`;
/// `order` may hold older copies of it, which are skipped on pop.
pub struct RecencyQueue {
    stamps: HashMap<ChunkKey, u64>,
    order: VecDeque<(ChunkKey, u64)>,
    stamp: u64,
}

impl Default for RecencyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RecencyQueue {
    pub fn new() -> Self {
        Self { stamps: HashMap::default(), order: VecDeque::default(), stamp: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Marks `key` as just accessed, moving it to the young end.
    pub fn touch(&mut self, key: ChunkKey) -> u64 {
        self.stamp += 1;
        let stamp = self.stamp;
        self.stamps.insert(key, stamp);
        self.order.push_back((key, stamp));
        self.maybe_compact();
        stamp
    }

    pub fn pop_oldest(&mut self) -> Option<(ChunkKey, u64)> {
        while let Some((k, stamp)) = self.order.pop_front() {
            let is_live = self.stamps.get(&k).map_or(false, |s| *s == stamp);
            if !is_live {
                continue;
            }
            self.stamps.remove(&k);
            return Some((k, stamp));
        }
        None
    }

    pub fn remove(&mut self, key: &ChunkKey) -> bool {
        self.stamps.remove(key).is_some()
    }

    fn maybe_compact(&mut self) {
        let max = self.stamps.len().saturating_mul(8).max(1024);
        if self.order.len() <= max {
            return;
        }

        let mut live: Vec<(ChunkKey, u64)> = self.stamps.iter().map(|(k, s)| (*k, *s)).collect();
        live.sort_unstable_by_key(|(_, s)| *s);
        self.order = live.into();
    }
}

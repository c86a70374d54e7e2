// src/streaming/priority.rs
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap as HashMap;

use super::types::ChunkKey;

/// Generation priority. Higher pops first; derived from proximity so that the
/// chunk under the user's focal point always has the largest demand.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Demand(pub i64);

impl Demand {
    #[inline]
    pub fn from_distance_squared(d2: f32) -> Self {
        // d2 is integral for integer chunk coordinates; round away float noise.
        Demand(-(d2.max(0.0).round() as i64))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Inserted,
    Raised,
    Unchanged,
}

#[derive(Clone, Copy, Debug)]
struct HeapItem {
    demand: Demand,
    // monotonically increasing tie-breaker; older entries win ties
    seq: u64,
    key: ChunkKey,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.demand == other.demand && self.seq == other.seq
    }
}

impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.demand
            .cmp(&other.demand)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-heap of chunk keys keyed by demand, with an index so each key appears
/// at most once logically. Updates are remove-by-key then insert; the heap
/// keeps stale entries until they surface and are skipped.
pub struct DemandQueue {
    heap: BinaryHeap<HeapItem>,
    live: HashMap<ChunkKey, (Demand, u64)>,
    seq: u64,
}

impl Default for DemandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DemandQueue {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new(), live: HashMap::default(), seq: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.live.contains_key(key)
    }

    pub fn demand_of(&self, key: &ChunkKey) -> Option<Demand> {
        self.live.get(key).map(|(d, _)| *d)
    }

    /// Inserts `key`, or raises it when it is already queued with a lower
    /// demand. A queued key never loses demand here.
    pub fn push(&mut self, key: ChunkKey, demand: Demand) -> PushOutcome {
        let outcome = match self.live.get(&key) {
            Some((cur, _)) if *cur >= demand => return PushOutcome::Unchanged,
            Some(_) => PushOutcome::Raised,
            None => PushOutcome::Inserted,
        };

        self.seq += 1;
        let seq = self.seq;
        self.live.insert(key, (demand, seq));
        self.heap.push(HeapItem { demand, seq, key });
        self.maybe_compact();

        outcome
    }

    pub fn pop(&mut self) -> Option<(ChunkKey, Demand)> {
        while let Some(item) = self.heap.pop() {
            let is_live = self.live.get(&item.key).map_or(false, |(_, s)| *s == item.seq);
            if !is_live {
                continue;
            }
            self.live.remove(&item.key);
            return Some((item.key, item.demand));
        }
        None
    }

    pub fn peek(&mut self) -> Option<(ChunkKey, Demand)> {
        while let Some(item) = self.heap.peek().copied() {
            if self.live.get(&item.key).map_or(false, |(_, s)| *s == item.seq) {
                return Some((item.key, item.demand));
            }
            self.heap.pop();
        }
        None
    }

    pub fn remove(&mut self, key: &ChunkKey) -> bool {
        // heap entry goes stale and is dropped lazily
        self.live.remove(key).is_some()
    }

    fn maybe_compact(&mut self) {
        let max = self.live.len().saturating_mul(4).max(1024);
        if self.heap.len() <= max {
            return;
        }

        self.heap = self
            .live
            .iter()
            .map(|(k, (demand, seq))| HeapItem { demand: *demand, seq: *seq, key: *k })
            .collect();
    }
}

// src/streaming/types.rs
use std::ops::Range;

#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
}

impl ChunkKey {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_within(self, region: &ChunkRegion) -> bool {
        region.contains(self)
    }
}

/// Half-open rectangle of chunk keys. Replaced wholesale whenever the viewport moves.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ChunkRegion {
    pub x: Range<i32>,
    pub y: Range<i32>,
}

impl ChunkRegion {
    pub const EMPTY: ChunkRegion = ChunkRegion { x: 0..0, y: 0..0 };

    pub const fn new(x: Range<i32>, y: Range<i32>) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn contains(&self, key: ChunkKey) -> bool {
        self.x.contains(&key.x) && self.y.contains(&key.y)
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let w = (self.x.end as i64 - self.x.start as i64) as usize;
        let h = (self.y.end as i64 - self.y.start as i64) as usize;
        w * h
    }

    /// Row-major walk over every key in the region.
    pub fn keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.y
            .clone()
            .flat_map(move |y| self.x.clone().map(move |x| ChunkKey { x, y }))
    }
}

/// Outbound notifications from the chunk coordinator. Consumers re-fetch through
/// the read accessor; the payload never travels with the event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StreamEvent {
    Generated(ChunkKey),
    Evicted(ChunkKey),
}

/// Where a key currently lives.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Residency {
    Absent,
    Queued,
    InProgress,
    Resident,
}

/// Result of one generation tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenerationTick {
    Stopped,
    Drained,
    Discarded(ChunkKey),
    Generated(ChunkKey),
}

/// Result of one eviction tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EvictionTick {
    Stopped,
    Empty,
    Retained(ChunkKey),
    // every remaining entry was re-checked and is still visible
    Settled,
    Evicted(ChunkKey),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestOutcome {
    pub queued: u32,
    pub raised: u32,
}

#[derive(Clone, Debug, Default)]
pub struct StreamStats {
    pub region: Option<ChunkRegion>,

    pub resident: u32,
    pub recency_len: u32,

    pub queued: u32,
    pub in_progress: u32,

    pub generated_total: u64,
    pub evicted_total: u64,
    pub discarded_total: u64,
}

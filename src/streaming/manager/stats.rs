// src/streaming/manager/stats.rs
use std::sync::atomic::Ordering;

use crate::streaming::types::*;
use crate::world::ChunkDataProvider;

use super::{lock, ChunkStore};

pub fn stats<P: ChunkDataProvider>(mgr: &ChunkStore<P>) -> StreamStats {
    let mut s = StreamStats { region: mgr.visible_region(), ..Default::default() };

    // one lock at a time; the snapshot is not atomic across both
    {
        let (resident, recency) = lock(&mgr.store).stats();
        s.resident    = resident as u32;
        s.recency_len = recency as u32;
    }
    {
        let gen = lock(&mgr.generation);
        s.queued      = gen.queue.len() as u32;
        s.in_progress = gen.in_progress.len() as u32;
    }

    s.generated_total = mgr.counters.generated.load(Ordering::Relaxed);
    s.evicted_total   = mgr.counters.evicted.load(Ordering::Relaxed);
    s.discarded_total = mgr.counters.discarded.load(Ordering::Relaxed);

    s
}

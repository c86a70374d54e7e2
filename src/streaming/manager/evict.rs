// src/streaming/manager/evict.rs
use std::sync::atomic::Ordering;

use crate::streaming::types::*;
use crate::world::ChunkDataProvider;

use super::{lock, ChunkStore};

/// One eviction tick: looks at the least recently used resident chunk and
/// drops it if it is out of view.
pub fn evict_next<P: ChunkDataProvider>(mgr: &ChunkStore<P>) -> EvictionTick {
    if !mgr.is_running() {
        return EvictionTick::Stopped;
    }
    let region = mgr.current_region();

    let evicted = {
        let mut store = lock(&mgr.store);
        let Some(key) = store.pop_oldest() else {
            return EvictionTick::Empty;
        };

        if key.is_within(&region) {
            log::trace!("retained {:?}", key);
            return if store.retain(key) {
                EvictionTick::Settled
            } else {
                EvictionTick::Retained(key)
            };
        }

        store.remove(&key);
        key
    };

    mgr.counters.evicted.fetch_add(1, Ordering::Relaxed);
    log::debug!("evicted {:?}", evicted);
    mgr.emit(StreamEvent::Evicted(evicted));
    EvictionTick::Evicted(evicted)
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::{unbounded, Receiver};

    use super::*;
    use crate::world::{GridTileProvider, GridVertex};

    fn store() -> (ChunkStore<GridTileProvider>, Receiver<StreamEvent>) {
        let (tx, rx) = unbounded();
        (ChunkStore::new(GridTileProvider::new(7), tx), rx)
    }

    fn fill(mgr: &ChunkStore<GridTileProvider>, region: ChunkRegion) {
        mgr.request_visible_region(region);
        while let GenerationTick::Generated(_) | GenerationTick::Discarded(_) = mgr.generate_next() {}
    }

    fn run(mgr: &ChunkStore<GridTileProvider>) -> Vec<EvictionTick> {
        let mut ticks = Vec::new();
        loop {
            let t = mgr.evict_next();
            ticks.push(t);
            if matches!(t, EvictionTick::Empty | EvictionTick::Settled | EvictionTick::Stopped) {
                return ticks;
            }
        }
    }

    #[test]
    fn shrinking_the_region_evicts_what_fell_out() {
        let (mgr, rx) = store();
        fill(&mgr, ChunkRegion::new(0..4, 0..4));
        assert_eq!(mgr.stats().resident, 16);

        mgr.request_visible_region(ChunkRegion::new(0..2, 0..2));
        run(&mgr);

        let stats = mgr.stats();
        assert_eq!(stats.resident, 4);
        assert_eq!(stats.recency_len, 4);
        assert_eq!(stats.evicted_total, 12);

        let evicted: Vec<_> =
            rx.try_iter().filter(|e| matches!(e, StreamEvent::Evicted(_))).collect();
        assert_eq!(evicted.len(), 12);
        assert!(!evicted.contains(&StreamEvent::Evicted(ChunkKey::new(1, 1))));

        assert!(mgr.vertices(ChunkKey::new(3, 3)).is_empty());
        assert!(!mgr.vertices(ChunkKey::new(1, 1)).is_empty());
    }

    #[test]
    fn far_corner_is_evicted_after_moving_away() {
        let (mgr, rx) = store();
        fill(&mgr, ChunkRegion::new(0..10, 0..10));
        rx.try_iter().for_each(drop);

        mgr.request_visible_region(ChunkRegion::new(5..10, 5..10));
        run(&mgr);

        assert!(rx.try_iter().any(|e| e == StreamEvent::Evicted(ChunkKey::new(0, 0))));
        assert_eq!(mgr.residency(ChunkKey::new(0, 0)), Residency::Absent);
        assert_eq!(mgr.stats().resident, 25);
    }

    #[test]
    fn visible_chunks_are_kept_and_the_loop_settles() {
        let (mgr, _rx) = store();
        let region = ChunkRegion::new(0..3, 0..1);
        fill(&mgr, region.clone());

        let ticks = run(&mgr);
        assert_eq!(ticks.len(), 3);
        assert!(matches!(ticks[0], EvictionTick::Retained(_)));
        assert_eq!(ticks[2], EvictionTick::Settled);
        assert_eq!(mgr.stats().resident, 3);

        // a fresh request re-arms a full pass
        mgr.request_visible_region(region);
        assert!(matches!(mgr.evict_next(), EvictionTick::Retained(_)));
    }

    #[test]
    fn recently_read_chunks_are_visited_last() {
        let (mgr, _rx) = store();
        fill(&mgr, ChunkRegion::new(0..3, 0..1));

        let read: Vec<GridVertex> = mgr.vertices(ChunkKey::new(0, 0));
        assert!(!read.is_empty());

        // (0,0) was generated first but was just read
        assert_eq!(mgr.evict_next(), EvictionTick::Retained(ChunkKey::new(1, 0)));
        assert_eq!(mgr.evict_next(), EvictionTick::Retained(ChunkKey::new(2, 0)));
        assert_eq!(mgr.evict_next(), EvictionTick::Settled);
    }

    #[test]
    fn empty_store_has_nothing_to_evict() {
        let (mgr, _rx) = store();
        mgr.request_visible_region(ChunkRegion::new(0..1, 0..1));
        assert_eq!(mgr.evict_next(), EvictionTick::Empty);

        mgr.shutdown();
        assert_eq!(mgr.evict_next(), EvictionTick::Stopped);
    }
}

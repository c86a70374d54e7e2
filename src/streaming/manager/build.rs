// src/streaming/manager/build.rs
use std::sync::{atomic::Ordering, Arc, PoisonError};

use rustc_hash::FxHashSet as HashSet;

use crate::streaming::priority::{Demand, PushOutcome};
use crate::streaming::{space, types::*};
use crate::world::ChunkDataProvider;

use super::{lock, ChunkStore};

/// Replaces the visible region and queues every chunk in it that is not
/// already resident or being generated.
///
/// Runs in three phases, one lock each: note what the generation side already
/// holds, filter out resident keys, then push. A key the first phase saw queued
/// or in progress and the last phase no longer finds was popped in between; it
/// is resident or about to be, so it is not queued again.
pub fn request_visible_region<P: ChunkDataProvider>(
    mgr: &ChunkStore<P>,
    region: ChunkRegion,
) -> RequestOutcome {
    if !mgr.is_running() {
        return RequestOutcome::default();
    }
    // requests run one at a time; only a request can queue a key
    let _serial = lock(&mgr.requests);

    let (focus, chunk_size_px) = {
        let mut v = mgr.view.write().unwrap_or_else(PoisonError::into_inner);
        v.region = Some(region.clone());
        (v.focus, v.chunk_size_px)
    };

    let pending: HashSet<ChunkKey> = {
        let gen = lock(&mgr.generation);
        region
            .keys()
            .filter(|k| gen.in_progress.contains(k) || gen.queue.contains(k))
            .collect()
    };

    let missing: Vec<ChunkKey> = {
        let mut store = lock(&mgr.store);
        // a new region may have pushed resident chunks out of view
        store.reset_streak();
        region.keys().filter(|k| !store.contains(k)).collect()
    };

    let mut out = RequestOutcome::default();
    {
        let mut gen = lock(&mgr.generation);
        for key in missing {
            if gen.in_progress.contains(&key) {
                continue;
            }
            if pending.contains(&key) && !gen.queue.contains(&key) {
                continue;
            }
            let demand =
                Demand::from_distance_squared(space::distance_squared(key, focus, chunk_size_px));
            match gen.queue.push(key, demand) {
                PushOutcome::Inserted => out.queued += 1,
                PushOutcome::Raised => out.raised += 1,
                PushOutcome::Unchanged => {}
            }
        }
    }

    log::debug!(
        "region x={:?} y={:?}: {} queued, {} raised",
        region.x,
        region.y,
        out.queued,
        out.raised
    );
    out
}

/// One generation tick: at most one provider call.
pub fn generate_next<P: ChunkDataProvider>(mgr: &ChunkStore<P>) -> GenerationTick {
    if !mgr.is_running() {
        return GenerationTick::Stopped;
    }

    let key = {
        let mut gen = lock(&mgr.generation);
        let Some((key, _)) = gen.queue.pop() else {
            return GenerationTick::Drained;
        };
        // region read inside the pop: a request that moved the region before
        // this section is always seen here
        if !key.is_within(&mgr.current_region()) {
            drop(gen);
            return discard(mgr, key);
        }
        gen.in_progress.insert(key);
        key
    };

    if lock(&mgr.store).contains(&key) {
        lock(&mgr.generation).in_progress.remove(&key);
        return discard(mgr, key);
    }

    let data = Arc::new(mgr.provider().generate_chunk_data(key));

    lock(&mgr.store).put(key, data);
    lock(&mgr.generation).in_progress.remove(&key);

    mgr.counters.generated.fetch_add(1, Ordering::Relaxed);
    log::debug!("generated {:?}", key);
    mgr.emit(StreamEvent::Generated(key));
    GenerationTick::Generated(key)
}

fn discard<P: ChunkDataProvider>(mgr: &ChunkStore<P>, key: ChunkKey) -> GenerationTick {
    mgr.counters.discarded.fetch_add(1, Ordering::Relaxed);
    log::trace!("discarded {:?}", key);
    GenerationTick::Discarded(key)
}

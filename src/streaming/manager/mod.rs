// src/streaming/manager/mod.rs
mod build;
mod evict;
mod stats;

use std::{
    io,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
    },
};

use crossbeam_channel::{bounded, Sender};
use glam::DVec2;
use rustc_hash::FxHashSet as HashSet;

use crate::config::StreamConfig;
use crate::streaming::{
    cache::ResidentStore,
    priority::DemandQueue,
    types::*,
    workers::{LoopControl, PeriodicLoop},
};
use crate::world::{ChunkData, ChunkDataProvider};

/// Viewport numbers the engine needs. Written by region/position updates.
/// May be read while the generation lock is held, never the other way round.
pub(crate) struct ViewState {
    pub region: Option<ChunkRegion>,
    // user origin in world pixels
    pub focus: DVec2,
    pub chunk_size_px: i32,
}

/// Generation lock bucket.
pub(crate) struct GenerationState {
    pub queue: DemandQueue,
    pub in_progress: HashSet<ChunkKey>,
}

#[derive(Default)]
pub(crate) struct Counters {
    pub generated: AtomicU64,
    pub evicted: AtomicU64,
    pub discarded: AtomicU64,
}

#[inline]
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // every critical section leaves its containers consistent
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared chunk state plus the single-step bodies of the two background loops.
///
/// Two lock domains: `store` (resident table + recency) and `generation`
/// (queue + in-progress set). No code path holds both. `view` is only ever
/// taken last and released first; `requests` only ever first.
pub struct ChunkStore<P: ChunkDataProvider> {
    provider: P,
    running: AtomicBool,

    pub(crate) view: RwLock<ViewState>,
    pub(crate) store: Mutex<ResidentStore<P::Data>>,
    pub(crate) generation: Mutex<GenerationState>,
    // held for a whole region request, outside the two locks above
    pub(crate) requests: Mutex<()>,

    events: Sender<StreamEvent>,
    pub(crate) counters: Counters,
}

impl<P: ChunkDataProvider> ChunkStore<P> {
    pub fn new(provider: P, events: Sender<StreamEvent>) -> Self {
        let chunk_size_px = provider.chunk_size_px();
        debug_assert!(chunk_size_px > 0, "chunk size must be positive");

        Self {
            provider,
            running: AtomicBool::new(true),
            view: RwLock::new(ViewState { region: None, focus: DVec2::ZERO, chunk_size_px }),
            store: Mutex::new(ResidentStore::new()),
            generation: Mutex::new(GenerationState {
                queue: DemandQueue::new(),
                in_progress: HashSet::default(),
            }),
            requests: Mutex::new(()),
            events,
            counters: Counters::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// After this, region requests and loop bodies are no-ops.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            log::info!("chunk store shutting down");
        }
    }

    /// Moves the focal point that demand is measured from.
    pub fn set_user_position(&self, origin: DVec2) {
        self.view.write().unwrap_or_else(PoisonError::into_inner).focus = origin;
    }

    pub fn visible_region(&self) -> Option<ChunkRegion> {
        self.view.read().unwrap_or_else(PoisonError::into_inner).region.clone()
    }

    /// The region the loop bodies gate on. Missing only if a loop runs before
    /// the first region request, which callers must never allow.
    pub(crate) fn current_region(&self) -> ChunkRegion {
        match self.visible_region() {
            Some(r) => r,
            None => {
                debug_assert!(false, "no visible region while streaming");
                log::error!("no visible region while streaming; treating as empty");
                ChunkRegion::EMPTY
            }
        }
    }

    /// Resident payload for `key`, touching it so it stays resident.
    pub fn chunk_data(&self, key: ChunkKey) -> Option<Arc<P::Data>> {
        lock(&self.store).get_touch(key)
    }

    /// Copy of the resident vertices for `key`, empty if not resident.
    pub fn vertices(&self, key: ChunkKey) -> Vec<<P::Data as ChunkData>::Vertex> {
        self.chunk_data(key).map(|d| d.vertices().to_vec()).unwrap_or_default()
    }

    pub fn residency(&self, key: ChunkKey) -> Residency {
        {
            let gen = lock(&self.generation);
            if gen.in_progress.contains(&key) {
                return Residency::InProgress;
            }
            if gen.queue.contains(&key) {
                return Residency::Queued;
            }
        }
        if lock(&self.store).contains(&key) {
            Residency::Resident
        } else {
            Residency::Absent
        }
    }

    pub fn stats(&self) -> StreamStats {
        stats::stats(self)
    }

    pub fn request_visible_region(&self, region: ChunkRegion) -> RequestOutcome {
        build::request_visible_region(self, region)
    }

    /// Single generation step, the body of the generation loop.
    pub fn generate_next(&self) -> GenerationTick {
        build::generate_next(self)
    }

    /// Single eviction step, the body of the eviction loop.
    pub fn evict_next(&self) -> EvictionTick {
        evict::evict_next(self)
    }

    pub(crate) fn emit(&self, ev: StreamEvent) {
        // consumer may be gone during teardown
        let _ = self.events.send(ev);
    }
}

/// Owns the shared store and the two background loops that drain it.
pub struct ChunkCoordinator<P: ChunkDataProvider> {
    store: Arc<ChunkStore<P>>,
    generation: PeriodicLoop,
    eviction: PeriodicLoop,
    stop_tx: Option<Sender<()>>,
}

impl<P: ChunkDataProvider> ChunkCoordinator<P> {
    pub fn start(provider: P, cfg: &StreamConfig, events: Sender<StreamEvent>) -> io::Result<Self> {
        let store = Arc::new(ChunkStore::new(provider, events));
        let (stop_tx, stop_rx) = bounded::<()>(0);

        let gen_store = store.clone();
        let generation = PeriodicLoop::spawn(
            "chunk-generate",
            cfg.generation_interval,
            stop_rx.clone(),
            move || match gen_store.generate_next() {
                GenerationTick::Generated(_) | GenerationTick::Discarded(_) => LoopControl::Continue,
                GenerationTick::Drained | GenerationTick::Stopped => LoopControl::Idle,
            },
        )?;

        let evict_store = store.clone();
        let eviction = PeriodicLoop::spawn(
            "chunk-evict",
            cfg.eviction_interval,
            stop_rx,
            move || match evict_store.evict_next() {
                EvictionTick::Evicted(_) | EvictionTick::Retained(_) => LoopControl::Continue,
                EvictionTick::Empty | EvictionTick::Settled | EvictionTick::Stopped => LoopControl::Idle,
            },
        )?;

        log::info!(
            "chunk coordinator started (generate every {:?}, evict every {:?})",
            cfg.generation_interval,
            cfg.eviction_interval
        );

        Ok(Self { store, generation, eviction, stop_tx: Some(stop_tx) })
    }

    pub fn store(&self) -> &Arc<ChunkStore<P>> {
        &self.store
    }

    /// Queues every missing chunk of `region` and arms both loops.
    pub fn request_visible_region(&self, region: ChunkRegion) -> RequestOutcome {
        if !self.store.is_running() {
            return RequestOutcome::default();
        }
        let out = self.store.request_visible_region(region);
        self.eviction.arm();
        self.generation.arm();
        out
    }

    pub fn set_user_position(&self, origin: DVec2) {
        self.store.set_user_position(origin);
    }

    pub fn chunk_data(&self, key: ChunkKey) -> Option<Arc<P::Data>> {
        self.store.chunk_data(key)
    }

    pub fn vertices(&self, key: ChunkKey) -> Vec<<P::Data as ChunkData>::Vertex> {
        self.store.vertices(key)
    }

    pub fn residency(&self, key: ChunkKey) -> Residency {
        self.store.residency(key)
    }

    pub fn stats(&self) -> StreamStats {
        self.store.stats()
    }

    pub fn is_generating(&self) -> bool {
        self.generation.is_running()
    }

    pub fn is_evicting(&self) -> bool {
        self.eviction.is_running()
    }

    /// Stops scheduling work. A provider call already in flight still
    /// completes and its result is kept.
    pub fn shutdown(&mut self) {
        self.store.shutdown();
        // closing the stop channel wakes both loops out of select
        self.stop_tx.take();
    }
}

impl<P: ChunkDataProvider> Drop for ChunkCoordinator<P> {
    fn drop(&mut self) {
        self.shutdown();
        self.generation.join();
        self.eviction.join();
    }
}

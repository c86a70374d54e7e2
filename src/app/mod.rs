// src/app/mod.rs
// --------------
// Composition root: viewport coordinator in front, chunk coordinator behind.
// Viewport events are forwarded to the engine synchronously; both event
// streams are republished to the render side on one channel.

pub mod input;
pub mod viewport;

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::DVec2;

use crate::config::{StreamConfig, ViewportConfig};
use crate::streaming::{ChunkCoordinator, ChunkKey, StreamEvent, StreamStats};
use crate::world::{ChunkData, ChunkDataProvider};

pub use input::{Direction, VectoredDirection, ViewportAction, ZoomDirection};
pub use viewport::{Viewport, ViewportCoordinator, ViewportEvent};

/// What the render/debug side hears about.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Viewport(ViewportEvent),
    Chunk(StreamEvent),
}

pub struct Game<P: ChunkDataProvider> {
    viewport: ViewportCoordinator,
    chunks: ChunkCoordinator<P>,

    viewport_rx: Receiver<ViewportEvent>,
    chunk_rx: Receiver<StreamEvent>,
    out_tx: Sender<GameEvent>,

    last_stats: Instant,
    stats_period: Duration,
}

impl<P: ChunkDataProvider> Game<P> {
    /// Starts the engine and queues the initial region. The returned receiver
    /// carries every event the render side should react to.
    pub fn new(
        provider: P,
        initial_size: DVec2,
        stream_cfg: &StreamConfig,
        viewport_cfg: ViewportConfig,
    ) -> io::Result<(Self, Receiver<GameEvent>)> {
        let (viewport_tx, viewport_rx) = unbounded();
        let (chunk_tx, chunk_rx) = unbounded();
        let (out_tx, out_rx) = unbounded();

        let viewport =
            ViewportCoordinator::new(initial_size, provider.chunk_size_px(), viewport_cfg, viewport_tx);
        let chunks = ChunkCoordinator::start(provider, stream_cfg, chunk_tx)?;

        chunks.set_user_position(viewport.user_position().origin);
        chunks.request_visible_region(viewport.visible_region().clone());

        let game = Self {
            viewport,
            chunks,
            viewport_rx,
            chunk_rx,
            out_tx,
            last_stats: Instant::now(),
            stats_period: Duration::from_secs(1),
        };
        Ok((game, out_rx))
    }

    pub fn viewport(&self) -> &ViewportCoordinator {
        &self.viewport
    }

    pub fn chunks(&self) -> &ChunkCoordinator<P> {
        &self.chunks
    }

    pub fn set_stats_period(&mut self, period: Duration) {
        self.stats_period = period;
    }

    /// Feeds one input action through the viewport and into the engine.
    pub fn apply(&mut self, action: ViewportAction) {
        self.viewport.apply(action);

        for ev in self.viewport_rx.try_iter() {
            match &ev {
                ViewportEvent::UserPositionChanged { user_position, .. } => {
                    self.chunks.set_user_position(user_position.origin);
                }
                ViewportEvent::VisibleRegionChanged(region) => {
                    self.chunks.request_visible_region(region.clone());
                }
            }
            let _ = self.out_tx.send(GameEvent::Viewport(ev));
        }
    }

    /// Once per frame: moves chunk events to the consumer channel and logs
    /// stream stats on the stats cadence. Returns how many chunk events moved.
    pub fn frame(&mut self) -> usize {
        let mut n = 0;
        for ev in self.chunk_rx.try_iter() {
            let _ = self.out_tx.send(GameEvent::Chunk(ev));
            n += 1;
        }

        if self.last_stats.elapsed() >= self.stats_period {
            self.last_stats = Instant::now();
            log_stats(&self.chunks.stats());
        }
        n
    }

    pub fn chunk_data(&self, key: ChunkKey) -> Option<Arc<P::Data>> {
        self.chunks.chunk_data(key)
    }

    pub fn vertices(&self, key: ChunkKey) -> Vec<<P::Data as ChunkData>::Vertex> {
        self.chunks.vertices(key)
    }

    pub fn stats(&self) -> StreamStats {
        self.chunks.stats()
    }

    pub fn shutdown(&mut self) {
        self.chunks.shutdown();
    }
}

fn log_stats(s: &StreamStats) {
    let region = s
        .region
        .as_ref()
        .map(|r| format!("x={:?} y={:?}", r.x, r.y))
        .unwrap_or_else(|| "-".to_string());

    log::info!(
        "[stream] region {} | resident {} (lru {}) | queued {} | in-flight {} | gen {} evict {} drop {}",
        region,
        s.resident,
        s.recency_len,
        s.queued,
        s.in_progress,
        s.generated_total,
        s.evicted_total,
        s.discarded_total,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::Residency;
    use crate::world::GridTileProvider;

    #[test]
    fn region_changes_reach_the_engine() {
        let (mut game, rx) = Game::new(
            GridTileProvider::new(3),
            DVec2::new(800.0, 600.0),
            &StreamConfig::default(),
            ViewportConfig::default(),
        )
        .unwrap();

        let initial = game.viewport().visible_region().clone();
        assert_eq!(game.chunks().store().visible_region(), Some(initial));

        for _ in 0..40 {
            game.apply(ViewportAction::pan([VectoredDirection::unit(Direction::East)]));
        }
        let moved = game.viewport().visible_region().clone();
        assert_eq!(game.chunks().store().visible_region(), Some(moved.clone()));

        let far = ChunkKey::new(moved.x.end - 1, 0);
        assert_ne!(game.chunks().residency(far), Residency::Absent);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Viewport(ViewportEvent::VisibleRegionChanged(_)))));
        game.shutdown();
    }
}

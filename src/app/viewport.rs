// src/app/viewport.rs
use std::f64::consts::SQRT_2;

use crossbeam_channel::Sender;
use glam::DVec2;
use rustc_hash::FxHashSet as HashSet;

use crate::app::input::{Direction, VectoredDirection, ViewportAction, ZoomDirection};
use crate::config::ViewportConfig;
use crate::streaming::{space, ChunkKey, ChunkRegion};

/// Pixel-space rectangle. `size` is the extent on each side of `origin`.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Viewport {
    pub origin: DVec2,
    pub size: DVec2,
}

impl Viewport {
    pub fn new(origin: DVec2, size: DVec2) -> Self {
        Self { origin, size }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ViewportEvent {
    UserPositionChanged { user_position: Viewport, drawable_size: DVec2 },
    VisibleRegionChanged(ChunkRegion),
}

/// Chunks covered by `viewport`, padded by a third of each axis (at least
/// `min_pad` chunks) on both sides.
pub fn visible_region(viewport: &Viewport, chunk_size_px: i32, min_pad: i32) -> ChunkRegion {
    let lo = viewport.origin - viewport.size;
    let hi = viewport.origin + viewport.size;

    let pad = |start: i32, end: i32| {
        let d = ((end - start) / 3).max(min_pad);
        (start - d)..(end + d)
    };

    ChunkRegion::new(
        pad(space::to_chunk_space(lo.x, chunk_size_px), space::to_chunk_space(hi.x, chunk_size_px)),
        pad(space::to_chunk_space(lo.y, chunk_size_px), space::to_chunk_space(hi.y, chunk_size_px)),
    )
}

/// Owns where the user is looking and which chunks that makes visible.
///
/// The user position moves with pan and zoom; the display viewport only tracks
/// the drawable size. Every change is published on `events`: the user position
/// first, then the region, so listeners that rank chunks by distance already
/// know the new focal point when the region arrives.
pub struct ViewportCoordinator {
    cfg: ViewportConfig,
    chunk_size_px: i32,

    user: Viewport,
    display: Viewport,
    zoom: f64,
    drawable_size: DVec2,
    region: ChunkRegion,

    events: Sender<ViewportEvent>,
}

impl ViewportCoordinator {
    pub fn new(
        initial_size: DVec2,
        chunk_size_px: i32,
        cfg: ViewportConfig,
        events: Sender<ViewportEvent>,
    ) -> Self {
        let initial = Viewport::new(DVec2::ZERO, initial_size);
        let region = visible_region(&initial, chunk_size_px, cfg.min_chunk_pad);

        Self {
            cfg,
            chunk_size_px,
            user: initial,
            display: initial,
            zoom: 1.0,
            drawable_size: DVec2::ZERO,
            region,
            events,
        }
    }

    pub fn user_position(&self) -> Viewport {
        self.user
    }

    pub fn display_viewport(&self) -> Viewport {
        self.display
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    pub fn drawable_size(&self) -> DVec2 {
        self.drawable_size
    }

    pub fn visible_region(&self) -> &ChunkRegion {
        &self.region
    }

    pub fn chunk_size_px(&self) -> i32 {
        self.chunk_size_px
    }

    pub fn distance_to_user_squared(&self, chunk: ChunkKey) -> f32 {
        space::distance_squared(chunk, self.user.origin, self.chunk_size_px)
    }

    pub fn apply(&mut self, action: ViewportAction) {
        match action {
            ViewportAction::Pan(directions) => self.pan(&directions),
            ViewportAction::Resize(size) => self.resize(size),
            ViewportAction::Zoom { direction, point, within } => self.zoom(direction, point, within),
        }
    }

    /// Moves the user position. Opposing directions must already be cancelled.
    pub fn pan(&mut self, directions: &HashSet<VectoredDirection>) {
        if directions.is_empty() {
            log::debug!("pan with no directions ignored");
            return;
        }

        // two perpendicular directions: keep diagonal speed equal to straight speed
        let step = if directions.len() == 2 {
            self.cfg.translation_step_px / SQRT_2
        } else {
            self.cfg.translation_step_px
        };

        let mut origin = self.user.origin;
        for v in directions {
            let d = step * self.zoom * v.magnitude;
            match v.direction {
                Direction::East => origin.x += d,
                Direction::West => origin.x -= d,
                Direction::North => origin.y += d,
                Direction::South => origin.y -= d,
            }
        }

        self.set_user_position(Viewport::new(origin, self.user.size), false);
    }

    /// New drawable size. Rescales both viewports and always republishes.
    pub fn resize(&mut self, to: DVec2) {
        self.drawable_size = to;
        self.display = Viewport::new(self.display.origin, to);
        self.set_user_position(Viewport::new(self.user.origin, to * self.zoom), true);
    }

    /// Zooms around `point` (screen space, origin lower-left) of a window of
    /// size `within`, keeping the world point under it fixed.
    pub fn zoom(&mut self, direction: ZoomDirection, point: DVec2, within: DVec2) {
        let change = match direction {
            ZoomDirection::In(amount) => 1.0 - amount * self.cfg.zoom_multiplier,
            ZoomDirection::Out(amount) => 1.0 + amount * self.cfg.zoom_multiplier,
        };
        let prev = self.zoom;
        self.zoom = (self.zoom * change).clamp(self.cfg.zoom_min, self.cfg.zoom_max);

        let density = pixel_density(self.drawable_size, within);
        let norm = density * 2.0 * point - self.display.size;
        let delta = norm * prev - norm * self.zoom;

        let next = Viewport::new(self.user.origin + delta / density, self.display.size * self.zoom);
        self.set_user_position(next, false);
    }

    fn set_user_position(&mut self, user: Viewport, force_region: bool) {
        self.user = user;
        self.emit(ViewportEvent::UserPositionChanged {
            user_position: user,
            drawable_size: self.drawable_size,
        });

        let region = visible_region(&user, self.chunk_size_px, self.cfg.min_chunk_pad);
        if force_region || region != self.region {
            self.region = region.clone();
            log::trace!("visible region x={:?} y={:?}", region.x, region.y);
            self.emit(ViewportEvent::VisibleRegionChanged(region));
        }
    }

    fn emit(&self, ev: ViewportEvent) {
        // listener may already be torn down
        let _ = self.events.send(ev);
    }
}

// Drawable pixels per window point, per axis. 1 until both sizes are known.
fn pixel_density(drawable: DVec2, within: DVec2) -> DVec2 {
    if drawable.x <= 0.0 || drawable.y <= 0.0 || within.x <= 0.0 || within.y <= 0.0 {
        return DVec2::ONE;
    }
    drawable / within
}

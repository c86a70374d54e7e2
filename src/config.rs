// src/config.rs
// -------------
// Global config knobs for tile streaming + the viewport.

use std::time::Duration;

// Size of one tile in pixels.
pub const TILE_SIZE_PX: i32 = 12;

// Size of one chunk edge in tiles.
pub const CHUNK_SIZE_TILES: i32 = 64;

pub const CHUNK_SIZE_PX: i32 = TILE_SIZE_PX * CHUNK_SIZE_TILES;

// Both background loops run one item per tick at this cadence.
pub const EVENT_LOOP_INTERVAL: Duration = Duration::from_millis(1);

// -----------------------------------------------------------------------------
// Viewport
// -----------------------------------------------------------------------------

// Pixels moved per pan tick at zoom 1.0.
pub const TRANSLATION_STEP_PX: f64 = 30.0;

pub const ZOOM_MIN: f64 = 0.2;
pub const ZOOM_MAX: f64 = 1.4;

// Zoom change per unit of scroll amount.
pub const ZOOM_MULTIPLIER: f64 = 0.01;

// Pad the visible region by at least this many chunks on every side.
pub const MIN_CHUNK_PAD: i32 = 1;

/// Runtime knobs for the chunk coordinator's background loops.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    pub generation_interval: Duration,
    pub eviction_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            generation_interval: EVENT_LOOP_INTERVAL,
            eviction_interval: EVENT_LOOP_INTERVAL,
        }
    }
}

/// Runtime knobs for the viewport coordinator.
#[derive(Clone, Debug)]
pub struct ViewportConfig {
    pub translation_step_px: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_multiplier: f64,
    pub min_chunk_pad: i32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            translation_step_px: TRANSLATION_STEP_PX,
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            zoom_multiplier: ZOOM_MULTIPLIER,
            min_chunk_pad: MIN_CHUNK_PAD,
        }
    }
}

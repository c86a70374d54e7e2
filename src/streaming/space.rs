// src/streaming/space.rs
// Pixel space <-> chunk space.

use glam::DVec2;

use super::types::ChunkKey;

/// Rounds half away from zero, so both sides of the origin snap symmetrically.
#[inline]
pub fn to_chunk_space(value: f64, chunk_size_px: i32) -> i32 {
    (value / chunk_size_px as f64).round() as i32
}

#[inline]
pub fn point_to_chunk(point: DVec2, chunk_size_px: i32) -> ChunkKey {
    ChunkKey::new(to_chunk_space(point.x, chunk_size_px), to_chunk_space(point.y, chunk_size_px))
}

/// Squared chunk-space distance from `chunk` to a pixel-space point. Squared to
/// keep the square root off the request path.
#[inline]
pub fn distance_squared(chunk: ChunkKey, point: DVec2, chunk_size_px: i32) -> f32 {
    let p = point_to_chunk(point, chunk_size_px);
    let dx = (p.x - chunk.x) as f32;
    let dy = (p.y - chunk.y) as f32;
    dx * dx + dy * dy
}

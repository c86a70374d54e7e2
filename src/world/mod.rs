// src/world/mod.rs
// Data provider contract the chunk coordinator generates through.

pub mod generator;
pub mod hash;

use crate::streaming::ChunkKey;

pub use generator::{Biome, GridTile, GridTileChunk, GridTileProvider, GridVertex};

/// Payload stored per resident chunk.
pub trait ChunkData: Send + Sync + 'static {
    type Vertex: Copy + Send + Sync + 'static;

    fn vertices(&self) -> &[Self::Vertex];
}

/// Turns a chunk key into chunk data. Called off the consumer thread; it has
/// no failure path, so implementations must always return data.
pub trait ChunkDataProvider: Send + Sync + 'static {
    type Data: ChunkData;

    /// Edge length of one chunk in world pixels.
    fn chunk_size_px(&self) -> i32;

    fn generate_chunk_data(&self, key: ChunkKey) -> Self::Data;
}

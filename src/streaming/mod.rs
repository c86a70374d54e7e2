// src/streaming/mod.rs
// Chunk residency: demand queue, resident store, background generate/evict loops.

pub mod manager;
pub mod space;

mod cache;
mod priority;
mod types;
mod workers;

pub use manager::{ChunkCoordinator, ChunkStore};
pub use priority::{Demand, DemandQueue, PushOutcome};
pub use types::{
    ChunkKey, ChunkRegion, EvictionTick, GenerationTick, RequestOutcome, Residency, StreamEvent,
    StreamStats,
};

// src/lib.rs
// Streams a 2D tile world in chunks around a moving viewport.

pub mod app;
pub mod config;
pub mod streaming;
pub mod world;

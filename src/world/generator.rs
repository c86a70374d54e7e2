// src/world/generator.rs
// Grid-tile chunk provider: every tile gets a biome by coordinate hash.

use bytemuck::{Pod, Zeroable};

use crate::config;
use crate::streaming::ChunkKey;
use crate::world::hash::CoordHash;
use crate::world::{ChunkData, ChunkDataProvider};

// Tiles sharing a patch lean toward the same biome so the grid reads as regions.
const PATCH_TILES: i32 = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Biome {
    Ocean,
    ShallowWater,
    Shore,
    Grassland,
    Forest,
    Desert,
    Bare,
    Snow,
}

impl Biome {
    pub const ALL: [Biome; 8] = [
        Biome::Ocean,
        Biome::ShallowWater,
        Biome::Shore,
        Biome::Grassland,
        Biome::Forest,
        Biome::Desert,
        Biome::Bare,
        Biome::Snow,
    ];

    pub fn color(self) -> [f32; 4] {
        match self {
            Biome::Ocean => [0.219, 0.211, 0.392, 1.0],
            Biome::ShallowWater => [0.350, 0.329, 0.481, 1.0],
            Biome::Shore => [0.638, 0.568, 0.453, 1.0],
            Biome::Grassland => [0.533, 0.667, 0.333, 1.0],
            Biome::Forest => [0.263, 0.533, 0.333, 1.0],
            Biome::Desert => [0.824, 0.725, 0.545, 1.0],
            Biome::Bare => [0.533, 0.533, 0.533, 1.0],
            Biome::Snow => [0.973, 0.973, 0.973, 1.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct GridVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridTile {
    // world tile coordinates
    pub x: i32,
    pub y: i32,
    pub kind: Biome,
}

impl GridTile {
    pub const VERTICES_PER_TILE: usize = 6;

    /// Two triangles covering the tile, in world pixels.
    pub fn push_vertices(&self, out: &mut Vec<GridVertex>) {
        let ts = config::TILE_SIZE_PX as f32;
        let x0 = self.x as f32 * ts;
        let y0 = self.y as f32 * ts;
        let x1 = x0 + ts;
        let y1 = y0 + ts;
        let color = self.kind.color();

        for position in [[x0, y0], [x1, y0], [x0, y1], [x1, y0], [x1, y1], [x0, y1]] {
            out.push(GridVertex { position, color });
        }
    }
}

pub struct GridTileChunk {
    pub key: ChunkKey,
    pub tiles: Vec<GridTile>,
    vertices: Vec<GridVertex>,
}

impl GridTileChunk {
    pub fn tile(&self, local_x: i32, local_y: i32) -> Option<&GridTile> {
        let cs = config::CHUNK_SIZE_TILES;
        if !(0..cs).contains(&local_x) || !(0..cs).contains(&local_y) {
            return None;
        }
        self.tiles.get((local_x * cs + local_y) as usize)
    }
}

impl ChunkData for GridTileChunk {
    type Vertex = GridVertex;

    fn vertices(&self) -> &[GridVertex] {
        &self.vertices
    }
}

#[derive(Clone, Debug)]
pub struct GridTileProvider {
    pub seed: u32,
    patches: CoordHash,
    tiles: CoordHash,
}

impl GridTileProvider {
    pub fn new(seed: u32) -> Self {
        let patches = CoordHash::new(seed);
        Self { seed, patches, tiles: patches.salted(0xA5A5_A5A5) }
    }

    pub fn biome_at(&self, tile_x: i32, tile_y: i32) -> Biome {
        let patch = self.patches.at(tile_x.div_euclid(PATCH_TILES), tile_y.div_euclid(PATCH_TILES));

        // mostly the patch biome, sometimes a neighbour in the table
        let n = Biome::ALL.len() as u32;
        let base = patch % n;
        let idx = if self.tiles.unit_at(tile_x, tile_y) < 0.8 {
            base
        } else {
            (base + 1 + self.tiles.at(tile_x, tile_y) % 2) % n
        };
        Biome::ALL[idx as usize]
    }
}

impl ChunkDataProvider for GridTileProvider {
    type Data = GridTileChunk;

    fn chunk_size_px(&self) -> i32 {
        config::CHUNK_SIZE_PX
    }

    fn generate_chunk_data(&self, key: ChunkKey) -> GridTileChunk {
        let cs = config::CHUNK_SIZE_TILES;
        let n = (cs * cs) as usize;

        let mut tiles = Vec::with_capacity(n);
        let mut vertices = Vec::with_capacity(n * GridTile::VERTICES_PER_TILE);

        for lx in 0..cs {
            for ly in 0..cs {
                let x = key.x * cs + lx;
                let y = key.y * cs + ly;
                let tile = GridTile { x, y, kind: self.biome_at(x, y) };
                tile.push_vertices(&mut vertices);
                tiles.push(tile);
            }
        }

        GridTileChunk { key, tiles, vertices }
    }
}

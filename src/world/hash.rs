// src/world/hash.rs
// Seeded coordinate hashing for tile classification.

/// Integer finalizer with good avalanche on 32 bits.
#[inline]
fn mix(mut v: u32) -> u32 {
    v ^= v >> 16;
    v = v.wrapping_mul(0x7feb_352d);
    v ^= v >> 15;
    v = v.wrapping_mul(0x846c_a68b);
    v ^ (v >> 16)
}

/// Deterministic 2D hash stream. Two hashers with different salts are
/// independent over the same coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordHash {
    seed: u32,
}

impl CoordHash {
    pub const fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn salted(self, salt: u32) -> Self {
        Self { seed: mix(self.seed ^ salt) }
    }

    #[inline]
    pub fn at(self, x: i32, y: i32) -> u32 {
        let a = (x as u32).wrapping_mul(0x9e37_79b1);
        let b = (y as u32).wrapping_mul(0x85eb_ca6b);
        mix(self.seed ^ a ^ b)
    }

    /// Same hash mapped to [0, 1).
    #[inline]
    pub fn unit_at(self, x: i32, y: i32) -> f64 {
        self.at(x, y) as f64 / 4_294_967_296.0
    }
}

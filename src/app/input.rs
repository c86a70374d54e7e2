// src/app/input.rs
// Platform-independent viewport actions. Whatever owns the window translates
// its key/scroll/resize events into these.

use std::hash::{Hash, Hasher};

use glam::DVec2;
use rustc_hash::FxHashSet as HashSet;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

/// A pan direction with a magnitude. Two values are the same direction
/// regardless of magnitude, so a set holds each direction at most once.
#[derive(Clone, Copy, Debug)]
pub struct VectoredDirection {
    pub direction: Direction,
    pub magnitude: f64,
}

impl VectoredDirection {
    pub fn new(direction: Direction, magnitude: f64) -> Self {
        Self { direction, magnitude: magnitude.abs() }
    }

    pub fn unit(direction: Direction) -> Self {
        Self::new(direction, 1.0)
    }

    /// Drops every pair of opposing directions.
    pub fn non_cancelled(set: &HashSet<VectoredDirection>) -> HashSet<VectoredDirection> {
        set.iter()
            .filter(|v| !set.contains(&VectoredDirection::unit(v.direction.opposite())))
            .copied()
            .collect()
    }
}

impl PartialEq for VectoredDirection {
    fn eq(&self, other: &Self) -> bool {
        self.direction == other.direction
    }
}

impl Eq for VectoredDirection {}

impl Hash for VectoredDirection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.direction.hash(state);
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ZoomDirection {
    In(f64),
    Out(f64),
}

impl ZoomDirection {
    /// Negative scroll amounts zoom in.
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            ZoomDirection::In(amount.abs())
        } else {
            ZoomDirection::Out(amount)
        }
    }
}

#[derive(Clone, Debug)]
pub enum ViewportAction {
    Pan(HashSet<VectoredDirection>),
    Resize(DVec2),
    Zoom { direction: ZoomDirection, point: DVec2, within: DVec2 },
}

impl ViewportAction {
    /// Pan action from held keys, with opposing keys cancelled out.
    pub fn pan<I: IntoIterator<Item = VectoredDirection>>(directions: I) -> Self {
        let set: HashSet<_> = directions.into_iter().collect();
        ViewportAction::Pan(VectoredDirection::non_cancelled(&set))
    }
}

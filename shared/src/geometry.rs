use std::fmt;
use std::hash::{Hash, Hasher};

/// Cell position on the toroidal grid.
///
/// `z` carries the terrain height read back from the grid when a coordinate is
/// normalized. It is payload only: equality and hashing look at `x` and `y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y, z: 0 }
    }

    pub const fn with_z(self, z: i32) -> Self {
        Self { z, ..self }
    }

    /// Shift by `(dx, dy)` without wrapping.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Wrap both axes into `[0, width) x [0, height)`. Negative inputs wrap
    /// from the opposite edge. The height payload is left untouched.
    pub fn wrap(self, width: usize, height: usize) -> Self {
        Self {
            x: self.x.rem_euclid(width as i32),
            y: self.y.rem_euclid(height as i32),
            z: self.z,
        }
    }

    /// Chebyshev distance under wraparound.
    pub fn toroidal_distance(self, other: Coord, width: usize, height: usize) -> u32 {
        let dx = wrapped_delta(self.x, other.x, width).unsigned_abs();
        let dy = wrapped_delta(self.y, other.y, height).unsigned_abs();
        dx.max(dy)
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for Coord {}

impl Hash for Coord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The eight compass headings, clockwise from north. North is `y - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    const OFFSETS: [(i32, i32); 8] = [
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Unit step `(dx, dy)` for this heading.
    pub fn offset(self) -> (i32, i32) {
        Self::OFFSETS[self.index()]
    }

    /// Rotate by `steps` eighths of a turn (positive is clockwise).
    pub fn rotated(self, steps: i32) -> Self {
        Self::from_index((self.index() as i32 + steps).rem_euclid(8) as usize)
    }

    pub fn opposite(self) -> Self {
        self.rotated(4)
    }

    /// Heading of a unit step, `None` for a zero step.
    pub fn from_step(dx: i32, dy: i32) -> Option<Self> {
        let step = (dx.signum(), dy.signum());
        Self::OFFSETS
            .iter()
            .position(|&o| o == step)
            .map(Self::from_index)
    }
}

/// The five cells an agent facing `facing` may step into, ordered
/// hard-left, half-left, forward, half-right, hard-right. The three cells
/// behind the agent are never included.
pub fn neighbors_for_direction(
    pos: Coord,
    facing: Direction,
    width: usize,
    height: usize,
) -> [Coord; 5] {
    let mut out = [Coord::default(); 5];
    for (slot, turn) in out.iter_mut().zip(-2..=2) {
        let (dx, dy) = facing.rotated(turn).offset();
        *slot = pos.offset(dx, dy).wrap(width, height);
    }
    out
}

/// The single cell straight ahead.
pub fn forward_cell(pos: Coord, facing: Direction, width: usize, height: usize) -> Coord {
    let (dx, dy) = facing.offset();
    pos.offset(dx, dy).wrap(width, height)
}

/// Heading of the step `from -> to`. A step across an edge is read the short
/// way round, so going from the last column to column 0 is east.
pub fn direction_to(from: Coord, to: Coord, width: usize, height: usize) -> Option<Direction> {
    Direction::from_step(
        wrapped_delta(from.x, to.x, width),
        wrapped_delta(from.y, to.y, height),
    )
}

/// Signed shortest offset from `a` to `b` on a ring of `n` cells.
fn wrapped_delta(a: i32, b: i32, n: usize) -> i32 {
    let n = n as i32;
    let d = (b - a).rem_euclid(n);
    if d > n / 2 { d - n } else { d }
}

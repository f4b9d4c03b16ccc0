pub mod ant;
mod colony;
pub mod dijkstra;
mod map;
mod memory;
mod pheromone;
mod timer;
mod world;

// Re-export key types for easier imports
pub use ant::{Ant, AntKey, AntState};
pub use colony::{Colony, Rgb};
pub use map::{Field, Grid, Terrain};
pub use memory::AntMemory;
pub use pheromone::ScentMap;
pub use timer::Stall;
pub use world::{Census, World};

// Scent constants
pub const MAX_SCENT: u32 = 100;
pub const STRONG_SCENT_THRESHOLD: i64 = 51; // effective scent at or above this is "strong"

// Neighbor selection weights
pub const STRONG_SCENT_MULTIPLIER: i64 = 3;
pub const DIRECTION_MULTIPLIER: i64 = 2;

// A searching ant gives up after this many ticks in a row without strong scent
pub const WEAK_SCENT_LIMIT: u8 = 3;

// Colony constants
pub const PRIMORDIAL_COLONY: u32 = 0;
pub const MAX_COLONIES: usize = 3;
pub const MAX_SPAWN_RADIUS: i32 = 10; // how far from home ants appear

// Memory depth bounds
pub const MAX_MEMORY_DEPTH: u32 = 100;

// Best-known path sentinel: no trip from this food source has completed yet
pub const UNKNOWN_PATH: u32 = u32::MAX;
// Reference path sentinel: the oracle found no route
pub const UNREACHABLE: i32 = -1;

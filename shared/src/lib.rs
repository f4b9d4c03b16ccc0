pub mod geometry;
pub mod util;

pub use geometry::{Coord, Direction};
pub use util::{stall_cost, step_cost};

pub mod config;
pub mod simulation;

pub use config::{SimulationConfig, load_config};
pub use simulation::World;

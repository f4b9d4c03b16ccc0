use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::simulation::{MAX_COLONIES, MAX_MEMORY_DEPTH, MAX_SCENT};

/// Smallest grid that still has five distinct neighbors per cell.
pub const MIN_SIDE_LENGTH: usize = 3;

/// Construction parameters of a world. Every field has a default, so a TOML
/// file only needs the values it changes.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub side_length: usize,
    pub agent_count: usize,
    pub food_count: usize,
    pub scent_increase: u32,
    pub scent_increase_strong: u32,
    /// Factor applied to every scent entry once per step.
    pub scent_decay: f64,
    pub min_home_food_distance: usize,
    pub max_height: i32,
    /// Run the reference shortest path search at construction.
    pub shortest_path: bool,
    pub max_colonies: usize,
    /// Chance per step of sending out a founder while colonies are missing.
    pub colony_spawn_chance: f64,
    pub memory_depth: u32,
    /// Fixed RNG seed; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            side_length: 20,
            agent_count: 25,
            food_count: 6,
            scent_increase: 12,
            scent_increase_strong: 24,
            scent_decay: 0.97,
            min_home_food_distance: 4,
            max_height: 3,
            shortest_path: true,
            max_colonies: 2,
            colony_spawn_chance: 0.02,
            memory_depth: 10,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Copy with every out-of-range value pulled to its nearest valid bound.
    pub fn validated(&self) -> Self {
        let mut cfg = self.clone();

        clamp_field("side_length", &mut cfg.side_length, MIN_SIDE_LENGTH, usize::MAX);
        let cells = cfg.side_length.saturating_mul(cfg.side_length);
        clamp_field("food_count", &mut cfg.food_count, 0, cells - 1);
        clamp_field("scent_increase", &mut cfg.scent_increase, 0, MAX_SCENT);
        clamp_field(
            "scent_increase_strong",
            &mut cfg.scent_increase_strong,
            0,
            MAX_SCENT,
        );
        clamp_probability("scent_decay", &mut cfg.scent_decay);
        clamp_field(
            "min_home_food_distance",
            &mut cfg.min_home_food_distance,
            0,
            cfg.side_length / 2,
        );
        clamp_field("max_height", &mut cfg.max_height, 0, i32::MAX);
        clamp_field("max_colonies", &mut cfg.max_colonies, 1, MAX_COLONIES);
        clamp_probability("colony_spawn_chance", &mut cfg.colony_spawn_chance);
        clamp_field("memory_depth", &mut cfg.memory_depth, 0, MAX_MEMORY_DEPTH);

        cfg
    }
}

fn clamp_field<T>(name: &str, value: &mut T, min: T, max: T)
where
    T: Ord + Copy + std::fmt::Debug,
{
    let clamped = (*value).clamp(min, max);
    if clamped != *value {
        debug!(field = name, from = ?*value, to = ?clamped, "clamped config value");
        *value = clamped;
    }
}

fn clamp_probability(name: &str, value: &mut f64) {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    if clamped != *value {
        debug!(field = name, from = *value, to = clamped, "clamped config value");
        *value = clamped;
    }
}

/// Loads the simulation configuration from a TOML file or uses defaults.
pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(SimulationConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    info!("Loaded config from '{}'", path.display());
    Ok(config)
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Coord, Direction, stall_cost};
use slotmap::SlotMap;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;

use super::ant::{CellView, Perception, Report};
use super::dijkstra;
use super::{
    Ant, AntKey, AntState, Colony, Grid, MAX_SPAWN_RADIUS, PRIMORDIAL_COLONY, Terrain,
    UNKNOWN_PATH, UNREACHABLE,
};

/// Random draws before falling back to a scan for a free cell.
const PLACEMENT_ATTEMPTS: usize = 64;

/// Ant counts per state and per colony at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Census {
    pub exploring: usize,
    pub searching: usize,
    pub carrying: usize,
    pub founding: usize,
    pub per_colony: Vec<usize>,
}

impl Census {
    pub fn total(&self) -> usize {
        self.exploring + self.searching + self.carrying + self.founding
    }
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ants (exploring {}, searching {}, carrying {}, founding {}) per colony {:?}",
            self.total(),
            self.exploring,
            self.searching,
            self.carrying,
            self.founding,
            self.per_colony
        )
    }
}

/// The whole simulation: grid, ants, colonies and path bookkeeping.
pub struct World {
    config: SimulationConfig,
    grid: Grid,
    ants: SlotMap<AntKey, Ant>,
    /// Ants in the order they act each step.
    order: Vec<AntKey>,
    colonies: Vec<Colony>,
    /// Home cell per colony id, reserved ones included.
    homes: Vec<Coord>,
    food: Vec<Coord>,
    reference_paths: Vec<i32>,
    best_paths: HashMap<Coord, u32>,
    tick: u64,
    rng: StdRng,
}

impl World {
    /// Build a world from `config`, clamping it first. Generates terrain,
    /// places the first home and the food, runs the reference path search and
    /// spawns the first colony's ants.
    pub fn new(config: &SimulationConfig) -> Self {
        let config = config.validated();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let side = config.side_length;
        let mut grid = Grid::generate(side, config.max_height, &mut rng);
        let home = Coord::new(
            rng.random_range(0..side as i32),
            rng.random_range(0..side as i32),
        );
        grid.set_height_at(home, rng.random_range(0..=config.max_height));

        let mut world = Self::assemble(config, grid, home, rng);
        world.place_food();
        world.compute_reference_paths();
        world.spawn_colony_ants(PRIMORDIAL_COLONY);

        info!(
            side,
            home = %world.homes[0],
            food = world.food.len(),
            ants = world.ants.len(),
            "World created"
        );
        for (food, path) in world.food.iter().zip(&world.reference_paths) {
            info!(%food, shortest = *path, "Reference path to home");
        }
        world
    }

    fn assemble(config: SimulationConfig, mut grid: Grid, home: Coord, mut rng: StdRng) -> Self {
        let home = grid.normalize(home);
        grid.place_home_at(home, PRIMORDIAL_COLONY);

        let mut colonies: Vec<Colony> = (0..config.max_colonies as u32)
            .map(|id| Colony::new(id, &mut rng))
            .collect();
        colonies[0].home = Some(home);

        Self {
            config,
            grid,
            ants: SlotMap::with_key(),
            order: Vec::new(),
            colonies,
            homes: vec![home],
            food: Vec::new(),
            reference_paths: Vec::new(),
            best_paths: HashMap::new(),
            tick: 0,
            rng,
        }
    }

    /// Advance by one tick: decay all scent, maybe send out a founder, then
    /// let every ant act in order. Always returns `true`.
    pub fn step(&mut self) -> bool {
        self.tick += 1;
        self.grid.decay_all(self.config.scent_decay);
        self.roll_founding();

        // Ants spawned during this step first act on the next one.
        let order = self.order.clone();
        for key in order {
            self.act(key);
        }
        true
    }

    fn act(&mut self, key: AntKey) {
        let Some(ant) = self.ants.get_mut(key) else {
            return;
        };
        if !ant.stall.is_ready() {
            ant.stall.pay();
            return;
        }

        let Some(view) = self.perceive(key) else {
            return;
        };
        let Some(ant) = self.ants.get_mut(key) else {
            return;
        };
        let transition = ant.decide(&view, &mut self.rng);
        ant.apply(&transition);

        if let Some(target) = transition.target {
            self.move_ant(key, target);
        }
        if let Some(report) = transition.report {
            self.handle_report(report);
        }
    }

    /// Snapshot of what the ant can sense, scored against its own colony.
    fn perceive(&self, key: AntKey) -> Option<Perception> {
        let ant = self.ants.get(key)?;
        let colony_of = |k: AntKey| self.ants.get(k).map(|a| a.colony_id);
        let view_of = |coord: Coord| {
            let field = self.grid.field(coord);
            let scent = field.scent();
            CellView {
                coord,
                terrain: field.terrain(),
                total_scent: scent.total(),
                colony_scent: scent.of_colony(ant.colony_id, colony_of),
                own_scent: scent.of(key),
            }
        };

        let carrier_here = self
            .grid
            .field(ant.pos)
            .occupants()
            .iter()
            .any(|&k| k != key && self.ants.get(k).is_some_and(|a| a.state.is_carrying()));

        Some(Perception {
            here: view_of(ant.pos),
            neighbors: self
                .grid
                .neighbors_for_direction(ant.pos, ant.facing)
                .map(view_of),
            forward: self.grid.forward_cell(ant.pos, ant.facing),
            carrier_here,
        })
    }

    fn move_ant(&mut self, key: AntKey, target: Coord) {
        let to = self.grid.normalize(target);
        let Some(from) = self.ants.get(key).map(|a| self.grid.normalize(a.pos)) else {
            return;
        };
        let facing = self.grid.direction_to(from, to);
        let delay = stall_cost(from.z, to.z);

        self.grid.field_mut(from).unregister_ant(key);
        self.grid.field_mut(to).register_ant(key);

        let Some(ant) = self.ants.get_mut(key) else {
            return;
        };
        ant.arrive(to, facing, delay);
        let amount = if ant.state.is_carrying() {
            self.config.scent_increase_strong
        } else {
            self.config.scent_increase
        };
        self.grid.field_mut(to).lay_scent(key, amount);
    }

    fn handle_report(&mut self, report: Report) {
        match report {
            Report::TripCompleted { food, length } => {
                if let Some(best) = self.best_paths.get_mut(&food) {
                    if length < *best {
                        *best = length;
                        info!(%food, length, tick = self.tick, "New best path");
                    }
                }
            }
            Report::ColonyFounded { colony_id, at } => self.found_colony(colony_id, at),
        }
    }

    fn roll_founding(&mut self) {
        if self.homes.len() >= self.config.max_colonies {
            return;
        }
        if !self.rng.random_bool(self.config.colony_spawn_chance) {
            return;
        }

        let Some(founder) = self.order.iter().copied().find(|&k| {
            self.ants
                .get(k)
                .is_some_and(|a| a.colony_id == PRIMORDIAL_COLONY)
        }) else {
            debug!("No ant left in the first colony to found a new one");
            return;
        };
        let Some(target) = self.free_cell_away_from_home() else {
            warn!("No free cell left for a new home");
            return;
        };

        let colony_id = self.homes.len() as u32;
        self.homes.push(target);
        if let Some(ant) = self.ants.get_mut(founder) {
            ant.begin_founding(colony_id, target);
            debug!(colony_id, from = %ant.pos, %target, "Founder dispatched");
        }
    }

    fn found_colony(&mut self, colony_id: u32, at: Coord) {
        let at = self.grid.normalize(at);
        self.grid.place_home_at(at, colony_id);
        if let Some(colony) = self.colonies.get_mut(colony_id as usize) {
            colony.home = Some(at);
        }
        if let Some(home) = self.homes.get_mut(colony_id as usize) {
            *home = at;
        }
        self.spawn_colony_ants(colony_id);
        info!(colony_id, home = %at, tick = self.tick, "Colony founded");
    }

    /// Spawn one colony's share of the ants in a square around its home.
    fn spawn_colony_ants(&mut self, colony_id: u32) {
        let Some(home) = self.homes.get(colony_id as usize).copied() else {
            return;
        };
        let radius = (self.config.min_home_food_distance as i32).min(MAX_SPAWN_RADIUS);
        let per_colony = self.config.agent_count / self.config.max_colonies;

        for _ in 0..per_colony {
            let x = self.draw_around(home.x, radius);
            let y = self.draw_around(home.y, radius);
            let facing = Direction::from_index(self.rng.random_range(0..Direction::ALL.len()));
            self.insert_ant(Coord::new(x, y), colony_id, facing, AntState::Exploring);
        }
    }

    fn draw_around(&mut self, center: i32, radius: i32) -> i32 {
        let lo = center - radius;
        let hi = (center + radius).max(lo + 1);
        self.rng.random_range(lo..hi)
    }

    /// Add an ant standing on `pos` and return its key.
    pub(crate) fn insert_ant(
        &mut self,
        pos: Coord,
        colony_id: u32,
        facing: Direction,
        state: AntState,
    ) -> AntKey {
        let pos = self.grid.normalize(pos);
        let mut ant = Ant::new(pos, colony_id, facing, self.config.memory_depth);
        ant.state = state;
        let key = self.ants.insert_with_key(|key| Ant { ant_key: key, ..ant });
        self.grid.field_mut(pos).register_ant(key);
        self.order.push(key);
        key
    }

    fn place_food(&mut self) {
        for _ in 0..self.config.food_count {
            let Some(food) = self.free_cell_away_from_home() else {
                warn!(
                    placed = self.food.len(),
                    wanted = self.config.food_count,
                    "Grid too crowded to place all food"
                );
                break;
            };
            self.grid.place_food_at(food);
            self.food.push(food);
            self.best_paths.insert(food, UNKNOWN_PATH);
        }
    }

    fn compute_reference_paths(&mut self) {
        if !self.config.shortest_path {
            return;
        }
        let home = self.homes[0];
        self.reference_paths = self
            .food
            .iter()
            .map(|&food| {
                dijkstra::shortest_path(&self.grid, food, home)
                    .map_or(UNREACHABLE, |cost| i32::try_from(cost).unwrap_or(i32::MAX))
            })
            .collect();
    }

    /// An empty, unreserved cell, preferably pushed away from the first home.
    fn free_cell_away_from_home(&mut self) -> Option<Coord> {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let candidate = self.candidate_away_from_home();
            if self.is_free(candidate) {
                return Some(candidate);
            }
        }
        self.grid.iter().map(|(c, _)| c).find(|&c| self.is_free(c))
    }

    fn is_free(&self, coord: Coord) -> bool {
        self.grid.terrain_at(coord) == Terrain::Empty && !self.homes.contains(&coord)
    }

    /// Uniform cell, with each axis that lands too close to the first home
    /// pushed out in steps of the minimum distance.
    fn candidate_away_from_home(&mut self) -> Coord {
        let side = self.grid.width as i32;
        let distance = self.config.min_home_food_distance as i32;
        let home = self.homes[0];

        let mut push_out = |center: i32| {
            let mut v = self.rng.random_range(0..side);
            while v < center + distance && v > center - distance {
                v += distance;
            }
            v
        };
        let y = push_out(home.y);
        let x = push_out(home.x);
        self.grid.normalize(Coord::new(x, y))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Home cells by colony id, including homes a founder is still walking to.
    pub fn home_coordinates(&self) -> &[Coord] {
        &self.homes
    }

    pub fn food_coordinates(&self) -> &[Coord] {
        &self.food
    }

    /// Cheapest food-to-home cost per food source, `UNREACHABLE` where none
    /// exists. Empty when the search is turned off.
    pub fn reference_shortest_paths(&self) -> &[i32] {
        &self.reference_paths
    }

    /// Shortest completed trip per food source; `UNKNOWN_PATH` until one
    /// finishes.
    pub fn best_known_paths(&self) -> &HashMap<Coord, u32> {
        &self.best_paths
    }

    pub fn colonies(&self) -> &[Colony] {
        &self.colonies
    }

    pub fn ants(&self) -> impl Iterator<Item = (AntKey, &Ant)> + '_ {
        self.order
            .iter()
            .filter_map(|&k| self.ants.get(k).map(|a| (k, a)))
    }

    pub fn ant(&self, key: AntKey) -> Option<&Ant> {
        self.ants.get(key)
    }

    pub fn colony_of(&self, key: AntKey) -> Option<u32> {
        self.ants.get(key).map(|a| a.colony_id)
    }

    pub fn census(&self) -> Census {
        let mut census = Census {
            per_colony: vec![0; self.colonies.len()],
            ..Census::default()
        };
        for (_, ant) in self.ants() {
            match ant.state {
                AntState::Exploring => census.exploring += 1,
                AntState::Searching { .. } => census.searching += 1,
                AntState::Carrying { .. } => census.carrying += 1,
                AntState::FoundingColony { .. } => census.founding += 1,
            }
            if let Some(n) = census.per_colony.get_mut(ant.colony_id as usize) {
                *n += 1;
            }
        }
        census
    }

    /// World on a given grid with fixed home and food cells and no ants.
    #[cfg(test)]
    pub(crate) fn from_layout(
        config: &SimulationConfig,
        grid: Grid,
        home: Coord,
        food: &[Coord],
    ) -> Self {
        let config = SimulationConfig {
            side_length: grid.width,
            ..config.clone()
        }
        .validated();
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));
        let mut world = Self::assemble(config, grid, home, rng);
        for &f in food {
            let f = world.grid.normalize(f);
            world.grid.place_food_at(f);
            world.food.push(f);
            world.best_paths.insert(f, UNKNOWN_PATH);
        }
        world.compute_reference_paths();
        world
    }
}

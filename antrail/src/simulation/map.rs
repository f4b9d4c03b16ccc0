use rand::Rng;
use shared::Coord;
use shared::Direction;
use shared::geometry;
use std::collections::{HashMap, HashSet};

use super::ant::AntKey;
use super::pheromone::ScentMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    Empty,
    Home(u32),
    Food,
}

/// One grid cell. Height is fixed once the grid is generated.
#[derive(Debug, Clone)]
pub struct Field {
    height: i32,
    terrain: Terrain,
    occupants: HashSet<AntKey>,
    scent: ScentMap,
}

impl Field {
    pub fn new(height: i32) -> Self {
        Self {
            height,
            terrain: Terrain::Empty,
            occupants: HashSet::new(),
            scent: ScentMap::new(),
        }
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline(always)]
    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn occupants(&self) -> &HashSet<AntKey> {
        &self.occupants
    }

    pub fn scent(&self) -> &ScentMap {
        &self.scent
    }

    /// Registers an ant as standing on this cell.
    pub fn register_ant(&mut self, ant: AntKey) {
        self.occupants.insert(ant);
    }

    /// Returns true if the ant was standing here.
    pub fn unregister_ant(&mut self, ant: AntKey) -> bool {
        self.occupants.remove(&ant)
    }

    pub fn lay_scent(&mut self, ant: AntKey, amount: u32) {
        self.scent.lay(ant, amount);
    }

    pub fn scent_per_colony<F>(&self, colony_of: F) -> HashMap<u32, u32>
    where
        F: Fn(AntKey) -> Option<u32>,
    {
        self.scent.per_colony(colony_of)
    }

    /// Colony with the most scent on this cell and its total, for coloring.
    /// Ties go to the lower colony id.
    pub fn dominant_colony<F>(&self, colony_of: F) -> Option<(u32, u32)>
    where
        F: Fn(AntKey) -> Option<u32>,
    {
        self.scent_per_colony(colony_of)
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }
}

pub struct Grid {
    pub width: usize,
    pub height: usize,
    fields: Vec<Vec<Field>>,
}

impl Grid {
    /// Grid with every cell at the same height.
    pub fn flat(width: usize, height: usize, level: i32) -> Self {
        Self {
            width,
            height,
            fields: vec![vec![Field::new(level); width]; height],
        }
    }

    /// Grid from explicit heights, indexed `[y][x]`. Rows must be equally long.
    pub fn from_heights(heights: Vec<Vec<i32>>) -> Self {
        let height = heights.len();
        let width = heights.first().map_or(0, Vec::len);
        let fields = heights
            .into_iter()
            .map(|row| row.into_iter().map(Field::new).collect())
            .collect();
        Self {
            width,
            height,
            fields,
        }
    }

    /// Square grid of rolling terrain. Each cell draws a fresh height, then
    /// picks between it and the heights of its already generated neighbors,
    /// weighted by how often each occurs, so plateaus form instead of noise.
    pub fn generate<R: Rng + ?Sized>(side: usize, max_height: i32, rng: &mut R) -> Self {
        let max_height = max_height.max(0);
        let mut heights: Vec<Vec<Option<i32>>> = vec![vec![None; side]; side];

        for y in 0..side {
            for x in 0..side {
                let mut counts: HashMap<i32, u32> = HashMap::new();
                counts.insert(rng.random_range(0..=max_height), 1);
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let n = Coord::new(x as i32 + dx, y as i32 + dy).wrap(side, side);
                        if let Some(h) = heights[n.y as usize][n.x as usize] {
                            *counts.entry(h).or_insert(0) += 1;
                        }
                    }
                }
                heights[y][x] = Some(pick_weighted_height(&counts, rng));
            }
        }

        Self::from_heights(
            heights
                .into_iter()
                .map(|row| row.into_iter().map(|h| h.unwrap_or(0)).collect())
                .collect(),
        )
    }

    /// Wrap a coordinate onto the grid and load its height into `z`.
    pub fn normalize(&self, coord: Coord) -> Coord {
        let c = coord.wrap(self.width, self.height);
        c.with_z(self.fields[c.y as usize][c.x as usize].height)
    }

    #[inline(always)]
    pub fn field(&self, coord: Coord) -> &Field {
        let c = coord.wrap(self.width, self.height);
        &self.fields[c.y as usize][c.x as usize]
    }

    #[inline(always)]
    pub fn field_mut(&mut self, coord: Coord) -> &mut Field {
        let c = coord.wrap(self.width, self.height);
        &mut self.fields[c.y as usize][c.x as usize]
    }

    pub fn terrain_at(&self, coord: Coord) -> Terrain {
        self.field(coord).terrain
    }

    pub fn neighbors_for_direction(&self, pos: Coord, facing: Direction) -> [Coord; 5] {
        geometry::neighbors_for_direction(pos, facing, self.width, self.height)
            .map(|c| self.normalize(c))
    }

    pub fn forward_cell(&self, pos: Coord, facing: Direction) -> Coord {
        self.normalize(geometry::forward_cell(pos, facing, self.width, self.height))
    }

    pub fn direction_to(&self, from: Coord, to: Coord) -> Option<Direction> {
        geometry::direction_to(from, to, self.width, self.height)
    }

    /// All eight surrounding cells, wrapped.
    pub fn ring(&self, pos: Coord) -> [Coord; 8] {
        Direction::ALL.map(|d| {
            let (dx, dy) = d.offset();
            self.normalize(pos.offset(dx, dy))
        })
    }

    /// Overwrite one cell's height. Only meant for laying out a new world.
    pub fn set_height_at(&mut self, coord: Coord, height: i32) {
        self.field_mut(coord).height = height;
    }

    pub fn place_food_at(&mut self, coord: Coord) {
        self.field_mut(coord).terrain = Terrain::Food;
    }

    pub fn place_home_at(&mut self, coord: Coord, colony_id: u32) {
        self.field_mut(coord).terrain = Terrain::Home(colony_id);
    }

    /// Scale every scent entry on the grid by `factor`.
    pub fn decay_all(&mut self, factor: f64) {
        for row in &mut self.fields {
            for field in row {
                field.scent.decay(factor);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Field)> + '_ {
        self.fields.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, field)| (Coord::new(x as i32, y as i32).with_z(field.height), field))
        })
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

fn pick_weighted_height<R: Rng + ?Sized>(counts: &HashMap<i32, u32>, rng: &mut R) -> i32 {
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0;
    }

    // Sort so the draw does not depend on hash order.
    let mut levels: Vec<(i32, u32)> = counts.iter().map(|(&h, &n)| (h, n)).collect();
    levels.sort_unstable();

    let draw = rng.random_range(0..total);
    let mut cumulative = 0;
    for (h, n) in &levels {
        cumulative += n;
        if draw < cumulative {
            return *h;
        }
    }
    levels.last().map_or(0, |&(h, _)| h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use slotmap::SlotMap;

    #[test]
    fn test_generate_respects_height_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let grid = Grid::generate(30, 5, &mut rng);
        assert_eq!(grid.width, 30);
        assert_eq!(grid.height, 30);
        for (_, field) in grid.iter() {
            assert!((0..=5).contains(&field.height()));
        }
    }

    #[test]
    fn test_generate_produces_plateaus() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = Grid::generate(40, 6, &mut rng);
        let mut same = 0;
        let mut pairs = 0;
        for (c, field) in grid.iter() {
            let east = grid.field(c.offset(1, 0));
            pairs += 1;
            if east.height() == field.height() {
                same += 1;
            }
        }
        // Uniform noise over 7 levels would match about 1 in 7.
        assert!(same * 4 > pairs, "only {same} of {pairs} neighbors level");
    }

    #[test]
    fn test_normalize_reads_height() {
        let grid = Grid::from_heights(vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]);
        let c = grid.normalize(Coord::new(-1, 4));
        assert_eq!((c.x, c.y, c.z), (2, 1, 5));
    }

    #[test]
    fn test_neighbors_carry_heights() {
        let grid = Grid::from_heights(vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]);
        let n = grid.neighbors_for_direction(Coord::new(1, 1), Direction::North);
        let zs: Vec<i32> = n.iter().map(|c| c.z).collect();
        assert_eq!(zs, vec![3, 0, 1, 2, 5]);
    }

    #[test]
    fn test_occupancy_and_dominant_colony() {
        let mut keys: SlotMap<AntKey, u32> = SlotMap::with_key();
        let a = keys.insert(0);
        let b = keys.insert(1);
        let c = keys.insert(1);

        let mut grid = Grid::flat(4, 4, 0);
        let at = Coord::new(2, 2);
        grid.field_mut(at).register_ant(a);
        assert!(grid.field(at).occupants().contains(&a));
        assert!(grid.field_mut(at).unregister_ant(a));
        assert!(!grid.field_mut(at).unregister_ant(a));

        grid.field_mut(at).lay_scent(a, 30);
        grid.field_mut(at).lay_scent(b, 20);
        grid.field_mut(at).lay_scent(c, 15);
        let colony_of = |k: AntKey| keys.get(k).copied();
        assert_eq!(grid.field(at).dominant_colony(colony_of), Some((1, 35)));
    }

    #[test]
    fn test_decay_all_touches_every_cell() {
        let mut keys: SlotMap<AntKey, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let mut grid = Grid::flat(3, 3, 0);
        for (c, _) in Grid::flat(3, 3, 0).iter() {
            grid.field_mut(c).lay_scent(a, 2);
        }
        grid.decay_all(0.5);
        assert!(grid.iter().all(|(_, f)| f.scent().of(a) == 1));
        grid.decay_all(0.5);
        assert!(grid.iter().all(|(_, f)| f.scent().is_empty()));
    }
}

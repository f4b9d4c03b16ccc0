use super::memory::AntMemory;
use super::{
    DIRECTION_MULTIPLIER, PRIMORDIAL_COLONY, STRONG_SCENT_MULTIPLIER, STRONG_SCENT_THRESHOLD,
    Stall, Terrain, WEAK_SCENT_LIMIT,
};

use rand::Rng;
use shared::{Coord, Direction};
use slotmap::{Key, new_key_type};

new_key_type! {
    /// Key for ant slotmap.
    pub struct AntKey;
}

/// Path length accounting for one food-to-home run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trip {
    pub food: Coord,
    pub length: u32,
}

impl Trip {
    pub fn start(food: Coord) -> Self {
        Self { food, length: 0 }
    }

    /// Trip with `cost` added, or `None` once the count would overflow.
    fn extended(self, cost: u32) -> Option<Self> {
        match self.length.checked_add(cost) {
            Some(length) if length != u32::MAX => Some(Self { length, ..self }),
            _ => None,
        }
    }
}

/// Behavioral state of an ant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntState {
    /// Wandering with no trail to follow.
    Exploring,
    /// Following colony scent towards food. `weak_streak` counts moves in a
    /// row that saw no strong scent.
    Searching { weak_streak: u8 },
    /// Bringing food home. Only ants of the first colony keep a trip record.
    Carrying { trip: Option<Trip> },
    /// Walking to the cell where a new colony will be founded.
    FoundingColony { target: Coord },
}

impl AntState {
    pub fn is_carrying(&self) -> bool {
        matches!(self, AntState::Carrying { .. })
    }
}

/// What an ant senses of one cell.
#[derive(Debug, Clone, Copy)]
pub struct CellView {
    pub coord: Coord,
    pub terrain: Terrain,
    /// Scent of every ant on the cell.
    pub total_scent: u32,
    /// Scent of the ant's own colony, its own included.
    pub colony_scent: u32,
    /// Scent the ant laid itself.
    pub own_scent: u32,
}

impl CellView {
    pub fn empty(coord: Coord) -> Self {
        Self {
            coord,
            terrain: Terrain::Empty,
            total_scent: 0,
            colony_scent: 0,
            own_scent: 0,
        }
    }
}

/// Everything an ant may look at when it decides: the cell it stands on, the
/// five cells it may step into and the cell straight ahead.
#[derive(Debug, Clone)]
pub struct Perception {
    pub here: CellView,
    pub neighbors: [CellView; 5],
    pub forward: Coord,
    /// Some ant on the current cell is carrying food.
    pub carrier_here: bool,
}

/// Something the world has to act on after an ant's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    TripCompleted { food: Coord, length: u32 },
    ColonyFounded { colony_id: u32, at: Coord },
}

/// Outcome of one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: AntState,
    pub turn_around: bool,
    pub target: Option<Coord>,
    pub report: Option<Report>,
}

impl Transition {
    fn stay(next: AntState) -> Self {
        Self {
            next,
            turn_around: false,
            target: None,
            report: None,
        }
    }

    fn step(next: AntState, target: Coord) -> Self {
        Self {
            next,
            turn_around: false,
            target: Some(target),
            report: None,
        }
    }
}

/// State of an ant.
#[derive(Debug, Clone)]
pub struct Ant {
    pub ant_key: AntKey,
    pub colony_id: u32,
    pub pos: Coord,
    pub facing: Direction,
    pub state: AntState,
    pub stall: Stall,
    pub memory: AntMemory,
}

impl Ant {
    /// Create a new exploring ant.
    pub fn new(pos: Coord, colony_id: u32, facing: Direction, memory_depth: u32) -> Self {
        Self {
            ant_key: AntKey::null(),
            colony_id,
            pos,
            facing,
            state: AntState::Exploring,
            stall: Stall::new(),
            memory: AntMemory::new(memory_depth),
        }
    }

    /// Pick the next state and move for this tick. Does not mutate anything.
    pub fn decide<R: Rng + ?Sized>(&self, view: &Perception, rng: &mut R) -> Transition {
        match self.state {
            AntState::Exploring => explore(self, view, rng),
            AntState::Searching { weak_streak } => search(self, weak_streak, view, rng),
            AntState::Carrying { trip } => carry(self, trip, view, rng),
            AntState::FoundingColony { target } => found_colony(self, target),
        }
    }

    /// Take on the state change of a decision. Movement is applied separately
    /// through `arrive`.
    pub fn apply(&mut self, transition: &Transition) {
        self.state = transition.next;
        if transition.turn_around {
            self.facing = self.facing.opposite();
        }
    }

    /// Bookkeeping after stepping onto `to`: memory, heading, stall and trip
    /// length. `delay` is the stall owed for the height difference crossed.
    pub fn arrive(&mut self, to: Coord, facing: Option<Direction>, delay: f64) {
        self.memory.remember(to);
        if let Some(facing) = facing {
            self.facing = facing;
        }
        self.pos = to;
        self.stall.set(delay);

        if let AntState::Carrying { trip } = &mut self.state {
            *trip = trip.and_then(|t| t.extended(delay.ceil() as u32));
        }
    }

    /// Leave the current colony to found `colony_id` at `target`.
    pub fn begin_founding(&mut self, colony_id: u32, target: Coord) {
        self.colony_id = colony_id;
        self.state = AntState::FoundingColony { target };
    }

    pub fn is_primordial(&self) -> bool {
        self.colony_id == PRIMORDIAL_COLONY
    }
}

/// State-dependent score of a cell. Searching and exploring ants ignore their
/// own scent; carrying ants follow it home. Foreign scent always counts
/// against the cell.
pub fn effective_scent(cell: &CellView, state: &AntState) -> i64 {
    let total = i64::from(cell.total_scent);
    let colony = i64::from(cell.colony_scent);
    let own = i64::from(cell.own_scent);
    let foreign = total - colony;
    match state {
        AntState::Carrying { .. } => colony - foreign,
        AntState::Searching { .. } | AntState::Exploring => (colony - own) - foreign,
        AntState::FoundingColony { .. } => 0,
    }
}

pub fn is_strong(score: i64) -> bool {
    score >= STRONG_SCENT_THRESHOLD
}

fn pick_up(ant: &Ant, food: Coord) -> Transition {
    let trip = ant.is_primordial().then(|| Trip::start(food));
    Transition {
        next: AntState::Carrying { trip },
        turn_around: true,
        target: None,
        report: None,
    }
}

fn explore<R: Rng + ?Sized>(ant: &Ant, view: &Perception, rng: &mut R) -> Transition {
    if view.here.terrain == Terrain::Food {
        return pick_up(ant, view.here.coord);
    }

    let strong_nearby = view
        .neighbors
        .iter()
        .any(|c| is_strong(effective_scent(c, &ant.state)));
    if view.carrier_here || strong_nearby {
        return Transition::stay(AntState::Searching { weak_streak: 0 });
    }

    let pick = rng.random_range(0..view.neighbors.len());
    Transition::step(AntState::Exploring, view.neighbors[pick].coord)
}

fn search<R: Rng + ?Sized>(
    ant: &Ant,
    weak_streak: u8,
    view: &Perception,
    rng: &mut R,
) -> Transition {
    if view.here.terrain == Terrain::Food {
        return pick_up(ant, view.here.coord);
    }

    let food: Vec<Coord> = view
        .neighbors
        .iter()
        .filter(|c| c.terrain == Terrain::Food)
        .map(|c| c.coord)
        .collect();
    if !food.is_empty() {
        let pick = food[rng.random_range(0..food.len())];
        return Transition::step(AntState::Searching { weak_streak }, pick);
    }

    let strong_nearby = view
        .neighbors
        .iter()
        .any(|c| is_strong(effective_scent(c, &ant.state)));
    let next = if strong_nearby {
        AntState::Searching { weak_streak: 0 }
    } else {
        let streak = weak_streak.saturating_add(1);
        if streak >= WEAK_SCENT_LIMIT {
            // Give up on the trail but still take this tick's step.
            AntState::Exploring
        } else {
            AntState::Searching {
                weak_streak: streak,
            }
        }
    };

    Transition::step(next, choose_weighted(ant, view, rng))
}

fn carry<R: Rng + ?Sized>(
    ant: &Ant,
    trip: Option<Trip>,
    view: &Perception,
    rng: &mut R,
) -> Transition {
    let home = Terrain::Home(ant.colony_id);

    if view.here.terrain == home {
        // Every return home starts a fresh weak streak; no count carries over
        // from before the food was picked up.
        return Transition {
            next: AntState::Searching { weak_streak: 0 },
            turn_around: true,
            target: None,
            report: trip.map(|t| Report::TripCompleted {
                food: t.food,
                length: t.length,
            }),
        };
    }

    let next = AntState::Carrying { trip };
    match view.neighbors.iter().find(|c| c.terrain == home) {
        Some(cell) => Transition::step(next, cell.coord),
        None => Transition::step(next, choose_weighted(ant, view, rng)),
    }
}

/// Walk straight at the target, one cell per axis per step. This one rule
/// does not take the short way across grid edges.
fn found_colony(ant: &Ant, target: Coord) -> Transition {
    if ant.pos == target {
        return Transition {
            next: AntState::Searching { weak_streak: 0 },
            turn_around: false,
            target: None,
            report: Some(Report::ColonyFounded {
                colony_id: ant.colony_id,
                at: target,
            }),
        };
    }

    let next = Coord::new(
        ant.pos.x + (target.x - ant.pos.x).clamp(-1, 1),
        ant.pos.y + (target.y - ant.pos.y).clamp(-1, 1),
    );
    Transition::step(AntState::FoundingColony { target }, next)
}

/// Selection weights for the five candidates.
///
/// Scores are rebased so the weakest candidate weighs at least 1, then grow
/// with remembered visits, double for the cell straight ahead and triple when
/// the raw score is strong.
pub fn neighbor_weights(ant: &Ant, view: &Perception) -> [i64; 5] {
    let raw = view.neighbors.map(|c| effective_scent(&c, &ant.state));
    let min = raw.iter().copied().min().unwrap_or(0);

    let mut weights = [0i64; 5];
    for (i, cell) in view.neighbors.iter().enumerate() {
        let mut w = if min <= 0 { raw[i] - min + 1 } else { raw[i] };
        w += i64::from(ant.memory.visits(cell.coord));
        if cell.coord == view.forward {
            w *= DIRECTION_MULTIPLIER;
        }
        if is_strong(raw[i]) {
            w *= STRONG_SCENT_MULTIPLIER;
        }
        weights[i] = w;
    }
    weights
}

/// Roulette-wheel pick among the five candidates.
pub fn choose_weighted<R: Rng + ?Sized>(ant: &Ant, view: &Perception, rng: &mut R) -> Coord {
    let weights = neighbor_weights(ant, view);
    match roulette(&weights, rng) {
        Some(i) => view.neighbors[i].coord,
        None => view.forward,
    }
}

/// Index drawn with probability proportional to its weight. Non-positive
/// weights are never drawn; `None` if nothing has positive weight.
pub fn roulette<R: Rng + ?Sized>(weights: &[i64], rng: &mut R) -> Option<usize> {
    let total: i64 = weights.iter().map(|&w| w.max(0)).sum();
    if total <= 0 {
        return None;
    }

    let draw = rng.random_range(0..total);
    let mut cumulative = 0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w.max(0);
        if cumulative > draw {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn row(pos: Coord) -> [CellView; 5] {
        [-2, -1, 0, 1, 2].map(|dx| CellView::empty(pos.offset(dx, -1)))
    }

    fn view_at(pos: Coord) -> Perception {
        let neighbors = row(pos);
        Perception {
            here: CellView::empty(pos),
            forward: neighbors[2].coord,
            neighbors,
            carrier_here: false,
        }
    }

    fn ant_at(pos: Coord, state: AntState) -> Ant {
        let mut ant = Ant::new(pos, PRIMORDIAL_COLONY, Direction::North, 10);
        ant.state = state;
        ant
    }

    fn strong(cell: &mut CellView) {
        cell.total_scent = 80;
        cell.colony_scent = 80;
    }

    #[test]
    fn test_effective_scent_by_state() {
        let cell = CellView {
            coord: Coord::new(0, 0),
            terrain: Terrain::Empty,
            total_scent: 90,
            colony_scent: 60,
            own_scent: 25,
        };
        let carrying = AntState::Carrying { trip: None };
        let searching = AntState::Searching { weak_streak: 0 };
        assert_eq!(effective_scent(&cell, &carrying), 60 - 30);
        assert_eq!(effective_scent(&cell, &searching), 35 - 30);
        assert_eq!(effective_scent(&cell, &AntState::Exploring), 35 - 30);
        let founding = AntState::FoundingColony {
            target: Coord::new(1, 1),
        };
        assert_eq!(effective_scent(&cell, &founding), 0);
    }

    #[test]
    fn test_strong_threshold_is_inclusive() {
        assert!(!is_strong(50));
        assert!(is_strong(51));
    }

    #[test]
    fn test_explore_on_food_picks_up_and_turns() {
        let mut rng = StdRng::seed_from_u64(1);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        view.here.terrain = Terrain::Food;
        let ant = ant_at(pos, AntState::Exploring);

        let t = ant.decide(&view, &mut rng);
        assert_eq!(
            t.next,
            AntState::Carrying {
                trip: Some(Trip::start(pos))
            }
        );
        assert!(t.turn_around);
        assert_eq!(t.target, None);
    }

    #[test]
    fn test_non_primordial_ants_keep_no_trip() {
        let mut rng = StdRng::seed_from_u64(1);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        view.here.terrain = Terrain::Food;
        let mut ant = ant_at(pos, AntState::Exploring);
        ant.colony_id = 2;

        let t = ant.decide(&view, &mut rng);
        assert_eq!(t.next, AntState::Carrying { trip: None });
    }

    #[test]
    fn test_explore_joins_carrier() {
        let mut rng = StdRng::seed_from_u64(2);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        view.carrier_here = true;
        let t = ant_at(pos, AntState::Exploring).decide(&view, &mut rng);
        assert_eq!(t.next, AntState::Searching { weak_streak: 0 });
        assert_eq!(t.target, None);
    }

    #[test]
    fn test_explore_switches_on_strong_neighbor() {
        let mut rng = StdRng::seed_from_u64(3);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        strong(&mut view.neighbors[4]);
        let t = ant_at(pos, AntState::Exploring).decide(&view, &mut rng);
        assert_eq!(t.next, AntState::Searching { weak_streak: 0 });
        assert_eq!(t.target, None);
    }

    #[test]
    fn test_explore_ignores_own_scent() {
        let mut rng = StdRng::seed_from_u64(4);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        view.neighbors[0].total_scent = 100;
        view.neighbors[0].colony_scent = 100;
        view.neighbors[0].own_scent = 100;
        let t = ant_at(pos, AntState::Exploring).decide(&view, &mut rng);
        assert_eq!(t.next, AntState::Exploring);
        let target = t.target.expect("explorer moves");
        assert!(view.neighbors.iter().any(|c| c.coord == target));
    }

    #[test]
    fn test_search_steps_onto_food_neighbor() {
        let mut rng = StdRng::seed_from_u64(5);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        view.neighbors[1].terrain = Terrain::Food;
        let t = ant_at(pos, AntState::Searching { weak_streak: 2 }).decide(&view, &mut rng);
        assert_eq!(t.target, Some(view.neighbors[1].coord));
        assert_eq!(t.next, AntState::Searching { weak_streak: 2 });
    }

    #[test]
    fn test_search_gives_up_after_three_weak_moves() {
        let mut rng = StdRng::seed_from_u64(6);
        let pos = Coord::new(5, 5);
        let view = view_at(pos);
        let mut ant = ant_at(pos, AntState::Searching { weak_streak: 0 });

        for expected in [
            AntState::Searching { weak_streak: 1 },
            AntState::Searching { weak_streak: 2 },
            AntState::Exploring,
        ] {
            let t = ant.decide(&view, &mut rng);
            assert_eq!(t.next, expected);
            assert!(t.target.is_some(), "every searching tick moves");
            ant.apply(&t);
        }
    }

    #[test]
    fn test_search_resets_streak_on_strong_scent() {
        let mut rng = StdRng::seed_from_u64(7);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        strong(&mut view.neighbors[3]);
        let t = ant_at(pos, AntState::Searching { weak_streak: 2 }).decide(&view, &mut rng);
        assert_eq!(t.next, AntState::Searching { weak_streak: 0 });
        assert!(t.target.is_some());
    }

    #[test]
    fn test_carry_home_reports_trip() {
        let mut rng = StdRng::seed_from_u64(8);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        view.here.terrain = Terrain::Home(PRIMORDIAL_COLONY);
        let trip = Trip {
            food: Coord::new(9, 9),
            length: 12,
        };
        let t = ant_at(pos, AntState::Carrying { trip: Some(trip) }).decide(&view, &mut rng);
        assert_eq!(t.next, AntState::Searching { weak_streak: 0 });
        assert!(t.turn_around);
        assert_eq!(t.target, None);
        assert_eq!(
            t.report,
            Some(Report::TripCompleted {
                food: Coord::new(9, 9),
                length: 12
            })
        );
    }

    #[test]
    fn test_carry_ignores_foreign_home() {
        let mut rng = StdRng::seed_from_u64(9);
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        view.here.terrain = Terrain::Home(1);
        view.neighbors[4].terrain = Terrain::Home(PRIMORDIAL_COLONY);
        let t = ant_at(pos, AntState::Carrying { trip: None }).decide(&view, &mut rng);
        assert_eq!(t.target, Some(view.neighbors[4].coord));
        assert_eq!(t.next, AntState::Carrying { trip: None });
        assert_eq!(t.report, None);
    }

    #[test]
    fn test_founding_steps_without_wrapping() {
        let ant = {
            let mut a = ant_at(Coord::new(1, 8), AntState::Exploring);
            a.begin_founding(1, Coord::new(6, 2));
            a
        };
        let mut rng = StdRng::seed_from_u64(10);
        let t = ant.decide(&view_at(ant.pos), &mut rng);
        assert_eq!(t.target, Some(Coord::new(2, 7)));
        assert_eq!(
            t.next,
            AntState::FoundingColony {
                target: Coord::new(6, 2)
            }
        );
    }

    #[test]
    fn test_founding_arrival_reports_colony() {
        let target = Coord::new(3, 3);
        let mut ant = ant_at(target, AntState::Exploring);
        ant.begin_founding(2, target);
        let mut rng = StdRng::seed_from_u64(11);
        let t = ant.decide(&view_at(target), &mut rng);
        assert_eq!(t.next, AntState::Searching { weak_streak: 0 });
        assert_eq!(t.target, None);
        assert_eq!(
            t.report,
            Some(Report::ColonyFounded {
                colony_id: 2,
                at: target
            })
        );
    }

    #[test]
    fn test_roulette_skips_zero_weights() {
        let mut rng = StdRng::seed_from_u64(12);
        let weights = [0, 5, 0, 3, 0];
        for _ in 0..2000 {
            let i = roulette(&weights, &mut rng).expect("positive weight exists");
            assert!(weights[i] > 0);
        }
        assert_eq!(roulette(&[0, 0, 0], &mut rng), None);
    }

    #[test]
    fn test_uniform_scent_favors_only_forward() {
        let mut rng = StdRng::seed_from_u64(13);
        let pos = Coord::new(5, 5);
        let view = view_at(pos);
        let ant = ant_at(pos, AntState::Searching { weak_streak: 0 });
        assert_eq!(neighbor_weights(&ant, &view), [1, 1, 2, 1, 1]);

        let trials = 60_000;
        let mut hits = [0usize; 5];
        for _ in 0..trials {
            let picked = choose_weighted(&ant, &view, &mut rng);
            let i = view.neighbors.iter().position(|c| c.coord == picked).unwrap();
            hits[i] += 1;
        }
        for (i, &n) in hits.iter().enumerate() {
            let expected = if i == 2 { 2.0 / 6.0 } else { 1.0 / 6.0 };
            let got = n as f64 / trials as f64;
            assert!((got - expected).abs() < 0.015, "slot {i}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_explore_step_is_uniform() {
        let mut rng = StdRng::seed_from_u64(14);
        let pos = Coord::new(5, 5);
        let view = view_at(pos);
        let ant = ant_at(pos, AntState::Exploring);

        let trials = 50_000;
        let mut hits = [0usize; 5];
        for _ in 0..trials {
            let t = ant.decide(&view, &mut rng);
            assert_eq!(t.next, AntState::Exploring);
            let target = t.target.unwrap();
            let i = view.neighbors.iter().position(|c| c.coord == target).unwrap();
            hits[i] += 1;
        }
        // No extra weight on the forward cell.
        for (i, &n) in hits.iter().enumerate() {
            let got = n as f64 / trials as f64;
            assert!((got - 0.2).abs() < 0.015, "slot {i}: {got}");
        }
    }

    #[test]
    fn test_weights_rebase_then_bias() {
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        // raw scores: -10, 0, 60 (forward), 5, 0
        view.neighbors[0].total_scent = 10;
        strong(&mut view.neighbors[2]);
        view.neighbors[2].colony_scent = 60;
        view.neighbors[2].total_scent = 60;
        view.neighbors[3].colony_scent = 5;
        view.neighbors[3].total_scent = 5;
        let mut ant = ant_at(pos, AntState::Carrying { trip: None });
        ant.memory.remember(view.neighbors[1].coord);

        // rebased: 1, 11, 71, 16, 11; memory +1 on slot 1; forward x2; strong x3
        assert_eq!(neighbor_weights(&ant, &view), [1, 12, 426, 16, 11]);
    }

    #[test]
    fn test_positive_scores_are_not_rebased() {
        let pos = Coord::new(5, 5);
        let mut view = view_at(pos);
        for (i, cell) in view.neighbors.iter_mut().enumerate() {
            cell.colony_scent = 2 + i as u32;
            cell.total_scent = 2 + i as u32;
        }
        let ant = ant_at(pos, AntState::Carrying { trip: None });
        assert_eq!(neighbor_weights(&ant, &view), [2, 3, 8, 5, 6]);
    }

    #[test]
    fn test_arrive_accumulates_trip_length() {
        let mut ant = ant_at(
            Coord::new(0, 0),
            AntState::Carrying {
                trip: Some(Trip::start(Coord::new(0, 0))),
            },
        );
        ant.arrive(Coord::new(1, 0), Some(Direction::East), 1.0);
        ant.arrive(Coord::new(2, 0), Some(Direction::East), 2f64.sqrt());
        assert_eq!(ant.facing, Direction::East);
        assert_eq!(ant.pos, Coord::new(2, 0));
        assert_eq!(ant.memory.visits(Coord::new(1, 0)), 1);
        match ant.state {
            AntState::Carrying { trip: Some(trip) } => assert_eq!(trip.length, 3),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(!ant.stall.is_ready());
    }

    #[test]
    fn test_trip_overflow_aborts_accounting() {
        let mut ant = ant_at(
            Coord::new(0, 0),
            AntState::Carrying {
                trip: Some(Trip {
                    food: Coord::new(0, 0),
                    length: u32::MAX - 1,
                }),
            },
        );
        ant.arrive(Coord::new(1, 0), None, 1.0);
        assert_eq!(ant.state, AntState::Carrying { trip: None });
    }
}

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use shared::{Coord, step_cost};

use super::Grid;

/// Heap entry ordered so the cheapest frontier cell pops first.
#[derive(Debug, PartialEq, Eq)]
struct Frontier {
    cost: u32,
    coord: Coord,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| (self.coord.y, self.coord.x).cmp(&(other.coord.y, other.coord.x)))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Minimum travel cost from `from` to `to` over the 8-connected toroidal grid.
/// Level steps cost 1; steps across a height difference cost the rounded-up
/// hypotenuse. `None` if `to` cannot be reached.
pub fn shortest_path(grid: &Grid, from: Coord, to: Coord) -> Option<u32> {
    let from = grid.normalize(from);
    let to = grid.normalize(to);

    let mut dist: HashMap<Coord, u32> = HashMap::with_capacity(grid.cell_count());
    let mut heap = BinaryHeap::new();

    dist.insert(from, 0);
    heap.push(Frontier {
        cost: 0,
        coord: from,
    });

    while let Some(Frontier { cost, coord }) = heap.pop() {
        if coord == to {
            return Some(cost);
        }
        if cost > dist.get(&coord).copied().unwrap_or(u32::MAX) {
            continue;
        }

        for next in grid.ring(coord) {
            let next_cost = cost.saturating_add(step_cost(coord.z, next.z));
            if next_cost < dist.get(&next).copied().unwrap_or(u32::MAX) {
                dist.insert(next, next_cost);
                heap.push(Frontier {
                    cost: next_cost,
                    coord: next,
                });
            }
        }
    }

    None
}

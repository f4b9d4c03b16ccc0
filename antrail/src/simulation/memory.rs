use std::collections::HashMap;

use shared::Coord;

/// How often an ant has stepped on each cell, capped at `depth`.
///
/// When a cell would go past the cap it stays at the cap and every other
/// remembered cell fades by one instead. Nothing is ever purged outright.
#[derive(Debug, Clone)]
pub struct AntMemory {
    visits: HashMap<Coord, u32>,
    depth: u32,
}

impl AntMemory {
    pub fn new(depth: u32) -> Self {
        Self {
            visits: HashMap::new(),
            depth,
        }
    }

    pub fn remember(&mut self, coord: Coord) {
        let count = self.visits(coord) + 1;
        if count > self.depth {
            for value in self.visits.values_mut() {
                *value = value.saturating_sub(1);
            }
            self.visits.insert(coord, self.depth);
        } else {
            self.visits.insert(coord, count);
        }
    }

    pub fn visits(&self, coord: Coord) -> u32 {
        self.visits.get(&coord).copied().unwrap_or(0)
    }
}

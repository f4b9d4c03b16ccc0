// Stall counter for terrain crossing
// Counts down from the owed delay to zero, one unit per tick

#[derive(Debug, Clone, Default)]
pub struct Stall {
    pub remaining: f64,
}

impl Stall {
    /// Create a stall counter with nothing owed
    pub fn new() -> Self {
        Self { remaining: 0.0 }
    }

    /// Returns true if no delay is owed and the ant may act
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Pay one tick of the owed delay
    pub fn pay(&mut self) {
        self.remaining -= 1.0;
    }

    /// Owe `delay` ticks from now on
    pub fn set(&mut self, delay: f64) {
        self.remaining = delay;
    }
}

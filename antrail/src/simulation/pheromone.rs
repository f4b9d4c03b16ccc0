use std::collections::HashMap;

use super::MAX_SCENT;
use super::ant::AntKey;

/// Scent laid on one cell, kept per depositing ant.
///
/// Values live in `1..=MAX_SCENT`; an entry that decays to zero is removed.
#[derive(Debug, Clone, Default)]
pub struct ScentMap {
    by_ant: HashMap<AntKey, u32>,
}

impl ScentMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn lay(&mut self, ant: AntKey, amount: u32) {
        if amount == 0 {
            return;
        }
        let value = self.by_ant.entry(ant).or_insert(0);
        *value = (*value + amount).min(MAX_SCENT);
    }

    /// Multiply every entry by `factor`, floor, and drop entries that reach zero.
    pub fn decay(&mut self, factor: f64) {
        self.by_ant.retain(|_, value| {
            *value = (f64::from(*value) * factor).floor() as u32;
            *value > 0
        });
    }

    pub fn of(&self, ant: AntKey) -> u32 {
        self.by_ant.get(&ant).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.by_ant.values().sum()
    }

    /// Sum of scent grouped by the colony each depositor currently belongs to.
    /// Depositors `colony_of` does not know are skipped.
    pub fn per_colony<F>(&self, colony_of: F) -> HashMap<u32, u32>
    where
        F: Fn(AntKey) -> Option<u32>,
    {
        self.by_ant
            .iter()
            .filter_map(|(&ant, &value)| colony_of(ant).map(|colony| (colony, value)))
            .fold(HashMap::new(), |mut sums, (colony, value)| {
                *sums.entry(colony).or_insert(0) += value;
                sums
            })
    }

    pub fn of_colony<F>(&self, colony: u32, colony_of: F) -> u32
    where
        F: Fn(AntKey) -> Option<u32>,
    {
        self.by_ant
            .iter()
            .filter(|&(&ant, _)| colony_of(ant) == Some(colony))
            .map(|(_, &value)| value)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ant.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_ant.len()
    }
}

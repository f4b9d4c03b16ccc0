use rand::Rng;
use rand::seq::IndexedRandom;
use shared::Coord;

/// Plain 8-bit RGB triple for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

const SCENT_PALETTES: [[Rgb; 3]; 3] = [
    [Rgb(255, 105, 180), Rgb(220, 20, 60), Rgb(255, 135, 141)],
    [Rgb(65, 102, 245), Rgb(0, 204, 255), Rgb(8, 146, 208)],
    [Rgb(204, 255, 0), Rgb(0, 250, 154), Rgb(0, 255, 0)],
];

const ANT_COLORS: [Rgb; 3] = [Rgb(0, 0, 0), Rgb(255, 255, 255), Rgb(255, 0, 0)];

/// Identity and display record of a colony. `home` stays `None` until the
/// founding ant reaches the reserved home cell.
#[derive(Debug, Clone)]
pub struct Colony {
    pub colony_id: u32,
    pub home: Option<Coord>,
    pub scent_color: Rgb,
    pub ant_color: Rgb,
}

impl Colony {
    pub fn new<R: Rng + ?Sized>(colony_id: u32, rng: &mut R) -> Self {
        let slot = colony_id as usize % SCENT_PALETTES.len();
        let scent_color = SCENT_PALETTES[slot]
            .choose(rng)
            .copied()
            .unwrap_or(SCENT_PALETTES[slot][0]);

        Self {
            colony_id,
            home: None,
            scent_color,
            ant_color: ANT_COLORS[slot],
        }
    }

    pub fn is_active(&self) -> bool {
        self.home.is_some()
    }
}

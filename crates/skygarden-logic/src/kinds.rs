//! Plant and island kinds, and the policy that picks them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlantKind {
    KelpBoa,
    KelpBull,
    BranchA,
    BranchTrumpet,
}

impl PlantKind {
    pub fn all() -> &'static [PlantKind] {
        &[
            PlantKind::KelpBoa,
            PlantKind::KelpBull,
            PlantKind::BranchA,
            PlantKind::BranchTrumpet,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IslandKind {
    BigIsland,
}

impl IslandKind {
    pub fn all() -> &'static [IslandKind] {
        &[IslandKind::BigIsland]
    }
}

/// Decides which kinds a thrown seed turns into.
///
/// The seed-to-plant correlation has no fixed rule, so it is a seam.
pub trait KindPolicy {
    /// `seed_size` is the thrown seed's current scale.
    fn choose_plant(&mut self, seed_size: f32) -> PlantKind;
    fn choose_island(&mut self) -> IslandKind;
    /// Yaw in degrees applied to a new island about the up axis.
    fn island_yaw_degrees(&mut self) -> f32;
}

/// Uniformly random kinds and yaw.
pub struct RandomKinds {
    rng: StdRng,
}

impl RandomKinds {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomKinds {
    fn default() -> Self {
        Self::new()
    }
}

impl KindPolicy for RandomKinds {
    fn choose_plant(&mut self, _seed_size: f32) -> PlantKind {
        let kinds = PlantKind::all();
        kinds[self.rng.gen_range(0..kinds.len())]
    }

    fn choose_island(&mut self) -> IslandKind {
        let kinds = IslandKind::all();
        kinds[self.rng.gen_range(0..kinds.len())]
    }

    fn island_yaw_degrees(&mut self) -> f32 {
        self.rng.gen_range(0.0..360.0)
    }
}

/// Always the same kinds and no yaw. Handy for scripted runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedKinds {
    pub plant: PlantKind,
    pub island: IslandKind,
}

impl KindPolicy for FixedKinds {
    fn choose_plant(&mut self, _seed_size: f32) -> PlantKind {
        self.plant
    }

    fn choose_island(&mut self) -> IslandKind {
        self.island
    }

    fn island_yaw_degrees(&mut self) -> f32 {
        0.0
    }
}

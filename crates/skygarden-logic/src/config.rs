//! Garden configuration - growth curves, mode speeds, placement and harvest tuning.
//!
//! Every section has sensible defaults; a JSON document only needs the keys it
//! overrides.

use serde::{Deserialize, Serialize};

use crate::growth::GrowthContext;
use crate::mergeable::MergeRule;

/// Complete garden configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    pub growth: GrowthConfig,
    pub modes: ModeConfig,
    pub placement: PlacementConfig,
    pub harvest: HarvestConfig,
    pub seeds: SeedConfig,
    pub save_file_name: SaveFileName,
}

impl GardenConfig {
    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Human-readable problems with this configuration. Empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let g = &self.growth;
        if g.life_span_seconds <= 0.0 {
            problems.push(format!(
                "growth.life_span_seconds must be positive, got {}",
                g.life_span_seconds
            ));
        }
        if g.min_growth > g.max_growth {
            problems.push(format!(
                "growth.min_growth ({}) exceeds growth.max_growth ({})",
                g.min_growth, g.max_growth
            ));
        }
        if !(0.0..=1.0).contains(&g.min_growth) || !(0.0..=1.0).contains(&g.max_growth) {
            problems.push("growth bounds must lie within [0, 1]".to_string());
        }
        if self.modes.tick_interval_seconds <= 0.0 {
            problems.push(format!(
                "modes.tick_interval_seconds must be positive, got {}",
                self.modes.tick_interval_seconds
            ));
        }
        if self.placement.min_seeds_to_spawn > self.placement.max_seeds_to_spawn {
            problems.push(format!(
                "placement.min_seeds_to_spawn ({}) exceeds placement.max_seeds_to_spawn ({})",
                self.placement.min_seeds_to_spawn, self.placement.max_seeds_to_spawn
            ));
        }
        if self.seeds.scale <= 0.0 {
            problems.push(format!("seeds.scale must be positive, got {}", self.seeds.scale));
        }
        problems
    }

    /// Growth context for the current mode.
    pub fn growth_context(&self, mode: GameMode) -> GrowthContext {
        GrowthContext {
            speed_multiplier: self.modes.speed_for(mode),
            tick_interval: self.modes.tick_interval_seconds,
            away_multiplier: self.modes.away_growth_speed,
        }
    }
}

/// Growth curve and charge tuning shared by all plants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Seconds a plant takes to grow from min to max at multiplier 1
    pub life_span_seconds: f64,
    pub min_growth: f32,
    pub max_growth: f32,
    /// Offline absence at or above this enters the dull state on resume
    pub dull_threshold_seconds: f64,
    pub dull_duration_seconds: f32,
    /// Charge gained per second while charging
    pub charge_speed: f32,
    /// Charge lost per second after charging stops
    pub cancel_charge_speed: f32,
    pub harvest_cooldown_seconds: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            life_span_seconds: 2.0 * 24.0 * 3600.0,
            min_growth: 0.0,
            max_growth: 1.0,
            dull_threshold_seconds: 6.0 * 3600.0,
            dull_duration_seconds: 3.0,
            charge_speed: 0.5,
            cancel_charge_speed: 1.0,
            harvest_cooldown_seconds: 10.0,
        }
    }
}

/// Operating mode, selecting the growth speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Building,
    Gazing,
}

/// Per-mode speeds and tick timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub building_speed: f32,
    pub gazing_speed: f32,
    /// Multiplier for growth accumulated while the app was closed
    pub away_growth_speed: f32,
    pub tick_interval_seconds: f32,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            building_speed: 1.0,
            gazing_speed: 4.0,
            away_growth_speed: 0.25,
            tick_interval_seconds: 0.1,
        }
    }
}

impl ModeConfig {
    pub fn speed_for(&self, mode: GameMode) -> f32 {
        match mode {
            GameMode::Building => self.building_speed,
            GameMode::Gazing => self.gazing_speed,
        }
    }
}

/// Placement search defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub clearance_distance: f32,
    pub max_attempts_per_pose: u32,
    /// Free space required in front of walls for idle seeds
    pub seed_wall_clearance: f32,
    pub min_seeds_to_spawn: usize,
    pub max_seeds_to_spawn: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            clearance_distance: 0.1,
            max_attempts_per_pose: 1000,
            seed_wall_clearance: 0.75,
            min_seeds_to_spawn: 3,
            max_seeds_to_spawn: 10,
        }
    }
}

/// What happens to a plant after it releases its seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HarvestPolicy {
    /// Plant rests through its cooldown, then grows again in place
    #[default]
    Regrow,
    /// Plant is erased along with its record
    Destroy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub policy: HarvestPolicy,
}

/// Thrown seed appearance and merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Uniform scale of a freshly spawned seed
    pub scale: f32,
    pub merge_rule: MergeRule,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            scale: 0.1,
            merge_rule: MergeRule::SameSizeOnly,
        }
    }
}

/// Name of the save document inside the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveFileName(pub String);

impl Default for SaveFileName {
    fn default() -> Self {
        Self("GardenData.json".to_string())
    }
}

impl std::fmt::Display for SaveFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//! SkyGarden Headless Garden Harness
//!
//! Drives scripted seed, growth, and persistence scenarios against the
//! in-memory room, anchor service, and clock. No headset, no rendering.
//!
//! Usage:
//!   cargo run -p skygarden-simtest
//!   cargo run -p skygarden-simtest -- --verbose

use chrono::Duration;
use tempfile::TempDir;

use skygarden_core::anchors::Template;
use skygarden_core::catalog::TemplateCatalog;
use skygarden_core::clock::Clock;
use skygarden_core::persistence::{GardenStore, PlantRecord};
use skygarden_core::prelude::*;
use skygarden_core::testing::{BoxRoom, FixedClock, MemoryAnchors};
use skygarden_logic::config::GrowthConfig;
use skygarden_logic::growth::GrowthState;
use skygarden_logic::kinds::{FixedKinds, KindPolicy};
use skygarden_logic::math::Bounds;
use skygarden_logic::placement::{find_poses, PlacementCandidate, PlacementRequest, SpawnLocation};

// ── Shipped configuration (same JSON a host would load) ─────────────────
const CONFIG_JSON: &str = include_str!("../../../data/garden_config.json");

const FIXED: FixedKinds = FixedKinds {
    plant: PlantKind::KelpBoa,
    island: IslandKind::BigIsland,
};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("SKYGARDEN_LOG", level))
        .target(env_logger::Target::Stdout)
        .init();

    println!("=== SkyGarden Garden Harness ===\n");

    let mut results = Vec::new();

    // 1. Shipped configuration
    results.extend(validate_config());

    // 2. Seed → island → plant, growth to max
    results.extend(scenario_first_plant());

    // 3. Offline catch-up on reload
    results.extend(scenario_offline_growth());

    // 4. Placement with nothing to land on
    results.extend(scenario_no_surfaces());

    // 5. Out-of-order anchor completions
    results.extend(scenario_completion_order());

    // 6. Whole garden through disk
    results.extend(validate_round_trip());

    // 7. Charge and harvest
    results.extend(validate_harvest());

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Five-second life span so a plant matures in 50 ticks.
fn fast_config() -> GardenConfig {
    GardenConfig {
        growth: GrowthConfig {
            life_span_seconds: 5.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Plant kinds in throw order.
struct SequenceKinds {
    plants: Vec<PlantKind>,
    next: usize,
}

impl KindPolicy for SequenceKinds {
    fn choose_plant(&mut self, _seed_size: f32) -> PlantKind {
        let kind = self.plants[self.next % self.plants.len()];
        self.next += 1;
        kind
    }

    fn choose_island(&mut self) -> IslandKind {
        IslandKind::BigIsland
    }

    fn island_yaw_degrees(&mut self) -> f32 {
        0.0
    }
}

struct Garden {
    dir: TempDir,
    anchors: MemoryAnchors,
    clock: FixedClock,
}

impl Garden {
    fn new() -> Result<Self, String> {
        let dir = TempDir::new().map_err(|e| format!("temp dir: {}", e))?;
        Ok(Self {
            dir,
            anchors: MemoryAnchors::new(),
            clock: FixedClock::epoch(),
        })
    }

    fn store(&self) -> GardenStore {
        GardenStore::open(self.dir.path().join("GardenData.json"))
    }

    fn open(&self, config: GardenConfig) -> GardenEngine {
        let mut engine = GardenEngine::new(config, self.store(), self.anchors.clone(), BoxRoom::standard(17))
            .with_clock(self.clock.clone())
            .with_kind_policy(FIXED)
            .with_rng_seed(17);
        engine.init_garden();
        engine
    }
}

fn setup_failed(name: &str, error: String) -> Vec<TestResult> {
    vec![TestResult::check(name, false, error)]
}

/// Throw one seed at the ceiling and let both anchor completions land.
fn plant_one(engine: &mut GardenEngine) -> Result<EntityId, String> {
    let before = engine.plant_ids();
    let seed = engine.spawn_seeds_at(&[Vec3::new(0.0, 1.5, -2.0)])[0];
    let target = engine.throw_seed(seed).map_err(|e| e.to_string())?;
    engine
        .seed_landed_on_ceiling(seed, target)
        .map_err(|e| e.to_string())?;
    engine.tick();
    engine.tick();
    engine
        .plant_ids()
        .into_iter()
        .find(|id| !before.contains(id))
        .ok_or_else(|| "no plant appeared".to_string())
}

fn run_ticks(engine: &mut GardenEngine, n: usize) {
    for _ in 0..n {
        engine.tick();
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_config() -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let config = match GardenConfig::from_json_str(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::check("config_parse", false, format!("JSON parse error: {}", e)));
            return results;
        }
    };

    let problems = config.validate();
    results.push(TestResult::check(
        "config_valid",
        problems.is_empty(),
        if problems.is_empty() {
            "no problems".to_string()
        } else {
            problems.join("; ")
        },
    ));

    results.push(TestResult::check(
        "config_matches_defaults",
        config == GardenConfig::default(),
        "shipped file mirrors built-in defaults",
    ));

    results
}

// ── 2. First plant ──────────────────────────────────────────────────────

fn scenario_first_plant() -> Vec<TestResult> {
    println!("--- Seed to plant ---");
    let garden = match Garden::new() {
        Ok(g) => g,
        Err(e) => return setup_failed("first_plant_setup", e),
    };
    let mut engine = garden.open(fast_config());
    let mut results = Vec::new();

    let plant = match plant_one(&mut engine) {
        Ok(p) => p,
        Err(e) => return setup_failed("first_plant_created", e),
    };
    results.push(TestResult::check(
        "island_then_plant",
        engine.island_count() == 1 && engine.plant_count() == 1,
        format!("{} islands, {} plants", engine.island_count(), engine.plant_count()),
    ));

    let start = engine.plant_growth(plant).unwrap_or(f32::NAN);
    results.push(TestResult::check(
        "plant_starts_at_min",
        start == 0.0,
        format!("growth {}", start),
    ));

    engine.drain_notifications();
    run_ticks(&mut engine, 50);
    let grown = engine.plant_growth(plant).unwrap_or(f32::NAN);
    results.push(TestResult::check(
        "fifty_ticks_to_max",
        grown == 1.0 && engine.plant_state(plant) == Some(GrowthState::FullyGrown),
        format!("growth {} state {:?}", grown, engine.plant_state(plant)),
    ));

    run_ticks(&mut engine, 20);
    let ready = engine
        .drain_notifications()
        .iter()
        .filter(|n| matches!(n, Notification::PlantReadyToHarvest { .. }))
        .count();
    results.push(TestResult::check(
        "ready_raised_once",
        ready == 1,
        format!("{} ready notifications", ready),
    ));

    results
}

// ── 3. Offline growth ───────────────────────────────────────────────────

fn scenario_offline_growth() -> Vec<TestResult> {
    println!("--- Offline growth ---");
    let garden = match Garden::new() {
        Ok(g) => g,
        Err(e) => return setup_failed("offline_setup", e),
    };
    let mut results = Vec::new();

    // Grow a plant, then pin its saved growth to 0.4
    let mut engine = garden.open(GardenConfig::default());
    let plant = match plant_one(&mut engine) {
        Ok(p) => p,
        Err(e) => return setup_failed("offline_plant_created", e),
    };
    engine.save();
    drop(engine);

    let mut store = garden.store();
    let kind = store.load().plant_map.get(&plant).map(|r| r.kind);
    store.upsert_plant(PlantRecord {
        id: plant,
        kind: kind.unwrap_or(FIXED.plant),
        growth: 0.4,
        created_at: garden.clock.now(),
    });
    store.stamp_visit(garden.clock.now());
    let saved = store.save();
    results.push(TestResult::check("offline_saved", saved, store.path().display().to_string()));

    garden.clock.advance(Duration::seconds(7200));
    let mut engine = garden.open(GardenConfig::default());
    engine.tick();

    let expected = 0.4 + 7200.0 / 172_800.0 * 0.25;
    let growth = engine.plant_growth(plant).unwrap_or(f32::NAN);
    results.push(TestResult::check(
        "offline_catch_up",
        (growth - expected).abs() < 1e-5,
        format!("growth {:.6}, expected {:.6}", growth, expected),
    ));

    // A month away clamps at max and starts dull
    engine.save();
    drop(engine);
    garden.clock.advance(Duration::days(30));
    let mut engine = garden.open(GardenConfig::default());
    engine.tick();
    let growth = engine.plant_growth(plant).unwrap_or(f32::NAN);
    results.push(TestResult::check(
        "offline_clamped",
        growth == 1.0 && matches!(engine.plant_state(plant), Some(GrowthState::Dull { .. })),
        format!("growth {} state {:?}", growth, engine.plant_state(plant)),
    ));

    results
}

// ── 4. No surfaces ──────────────────────────────────────────────────────

fn scenario_no_surfaces() -> Vec<TestResult> {
    println!("--- No surfaces ---");
    let mut room = BoxRoom::without_surfaces(3);
    let bounds = plant_bounds();
    let request = PlacementRequest::new(Some(bounds), 1, SpawnLocation::HangingDown).with_max_attempts(3);
    let poses = find_poses(&mut room, &request);

    vec![TestResult::check(
        "no_surface_invalid",
        poses == vec![PlacementCandidate::INVALID],
        format!("{:?}", poses),
    )]
}

/// Bounds of the standard template for the scripted plant kind.
fn plant_bounds() -> Bounds {
    TemplateCatalog::standard()
        .plant(FIXED.plant)
        .map(|t| t.bounds)
        .unwrap_or_default()
}

// ── 5. Completion order ─────────────────────────────────────────────────

fn scenario_completion_order() -> Vec<TestResult> {
    println!("--- Completion order ---");
    let garden = match Garden::new() {
        Ok(g) => g,
        Err(e) => return setup_failed("order_setup", e),
    };
    let mut engine = GardenEngine::new(fast_config(), garden.store(), garden.anchors.clone(), BoxRoom::standard(5))
        .with_clock(garden.clock.clone())
        .with_kind_policy(SequenceKinds {
            plants: vec![PlantKind::BranchTrumpet, PlantKind::KelpBull],
            next: 0,
        });
    let mut results = Vec::new();

    garden.anchors.hold();
    for seed in engine.spawn_seeds_at(&[Vec3::ZERO, Vec3::X]) {
        let landed = engine
            .throw_seed(seed)
            .and_then(|target| engine.seed_landed_on_ceiling(seed, target));
        if let Err(e) = landed {
            return setup_failed("order_throw", e.to_string());
        }
    }

    garden.anchors.release(1);
    engine.tick();
    let first = garden.anchors.created_templates().last().copied();
    results.push(TestResult::check(
        "first_island_takes_first_seed",
        first == Some(Template::Plant(PlantKind::BranchTrumpet)),
        format!("{:?}", first),
    ));

    garden.anchors.resume();
    run_ticks(&mut engine, 2);
    results.push(TestResult::check(
        "both_plants_grow",
        engine.island_count() == 2 && engine.plant_count() == 2,
        format!("{} islands, {} plants", engine.island_count(), engine.plant_count()),
    ));

    results
}

// ── 6. Round trip ───────────────────────────────────────────────────────

fn validate_round_trip() -> Vec<TestResult> {
    println!("--- Round trip ---");
    let garden = match Garden::new() {
        Ok(g) => g,
        Err(e) => return setup_failed("round_trip_setup", e),
    };
    let mut results = Vec::new();

    let mut engine = garden.open(fast_config());
    let mut plants = Vec::new();
    for _ in 0..3 {
        match plant_one(&mut engine) {
            Ok(p) => plants.push(p),
            Err(e) => return setup_failed("round_trip_plant", e),
        }
    }
    run_ticks(&mut engine, 7);
    let before: Vec<Option<f32>> = plants.iter().map(|p| engine.plant_growth(*p)).collect();
    let islands = engine.island_ids();
    let saved = engine.shutdown();
    drop(engine);
    results.push(TestResult::check("round_trip_saved", saved, format!("{} plants", plants.len())));

    let mut engine = garden.open(fast_config());
    engine.tick();
    let after: Vec<Option<f32>> = plants.iter().map(|p| engine.plant_growth(*p)).collect();
    results.push(TestResult::check(
        "round_trip_growth",
        before == after,
        format!("before {:?} after {:?}", before, after),
    ));
    results.push(TestResult::check(
        "round_trip_islands",
        engine.island_ids() == islands,
        format!("{} islands", engine.island_count()),
    ));

    engine.destroy_garden();
    engine.tick();
    let mut store = garden.store();
    results.push(TestResult::check(
        "destroy_garden_empties_store",
        store.load().is_empty() && garden.anchors.stored_count() == 0,
        format!("{} anchors left", garden.anchors.stored_count()),
    ));

    results
}

// ── 7. Harvest ──────────────────────────────────────────────────────────

fn validate_harvest() -> Vec<TestResult> {
    println!("--- Harvest ---");
    let garden = match Garden::new() {
        Ok(g) => g,
        Err(e) => return setup_failed("harvest_setup", e),
    };
    let mut engine = garden.open(fast_config());
    let mut results = Vec::new();

    let plant = match plant_one(&mut engine) {
        Ok(p) => p,
        Err(e) => return setup_failed("harvest_plant", e),
    };
    let early = engine.begin_charge(plant);
    results.push(TestResult::check(
        "charge_needs_full_growth",
        early == Err(GardenError::NotFullyGrown(plant)),
        format!("{:?}", early),
    ));

    run_ticks(&mut engine, 50);
    engine.drain_notifications();
    if let Err(e) = engine.begin_charge(plant) {
        return setup_failed("harvest_charge", e.to_string());
    }
    run_ticks(&mut engine, 21);

    let released = engine.drain_notifications().iter().find_map(|n| match n {
        Notification::SeedSpawnedFromPlant { seeds, .. } => Some(*seeds),
        _ => None,
    });
    results.push(TestResult::check(
        "harvest_releases_seeds",
        matches!(released, Some(n) if (2..=5).contains(&n)),
        format!("{:?} seeds", released),
    ));
    results.push(TestResult::check(
        "harvest_seeds_idle",
        Some(engine.idle_seeds().len()) == released,
        format!("{} idle seeds", engine.idle_seeds().len()),
    ));

    let idle = engine.idle_seeds();
    if idle.len() >= 2 {
        let merged = engine.seeds_touched(idle[0], idle[1]);
        results.push(TestResult::check(
            "equal_seeds_merge",
            merged.is_some() && engine.idle_seeds().len() == idle.len() - 1,
            format!("absorbed {:?}", merged),
        ));
    }

    results
}

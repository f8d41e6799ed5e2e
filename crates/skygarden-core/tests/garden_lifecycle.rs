//! Integration tests for the garden engine.
//!
//! Exercises: throw → ceiling → island → plant, growth to harvest,
//! save / reload with offline catch-up, and anchor completion ordering.
//!
//! Everything runs against the in-memory room, anchors, and clock.

use chrono::Duration;
use tempfile::TempDir;

use skygarden_core::anchors::{AnchorEvent, AnchorService, Template};
use skygarden_core::catalog::TemplateCatalog;
use skygarden_core::clock::Clock;
use skygarden_core::persistence::{GardenStore, PlantRecord};
use skygarden_core::prelude::*;
use skygarden_core::testing::{AnchorRequest, BoxRoom, FixedClock, MemoryAnchors};
use skygarden_logic::config::{GrowthConfig, HarvestPolicy};
use skygarden_logic::growth::GrowthState;
use skygarden_logic::kinds::{FixedKinds, KindPolicy};
use skygarden_logic::math::Quat;

// ── Helpers ────────────────────────────────────────────────────────────

const FIXED: FixedKinds = FixedKinds {
    plant: PlantKind::KelpBoa,
    island: IslandKind::BigIsland,
};

/// Hands out plant kinds in order, then repeats the last.
struct ScriptedKinds(Vec<PlantKind>);

impl KindPolicy for ScriptedKinds {
    fn choose_plant(&mut self, _seed_size: f32) -> PlantKind {
        if self.0.len() > 1 {
            self.0.remove(0)
        } else {
            self.0[0]
        }
    }

    fn choose_island(&mut self) -> IslandKind {
        IslandKind::BigIsland
    }

    fn island_yaw_degrees(&mut self) -> f32 {
        0.0
    }
}

/// Five-second life span: 50 ticks of 0.1s from min to max.
fn fast_config() -> GardenConfig {
    GardenConfig {
        growth: GrowthConfig {
            life_span_seconds: 5.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

struct Rig {
    dir: TempDir,
    anchors: MemoryAnchors,
    clock: FixedClock,
}

impl Rig {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            anchors: MemoryAnchors::new(),
            clock: FixedClock::epoch(),
        }
    }

    fn store(&self) -> GardenStore {
        GardenStore::open(self.dir.path().join("GardenData.json"))
    }

    fn engine(&self, config: GardenConfig) -> GardenEngine {
        let mut engine = GardenEngine::new(config, self.store(), self.anchors.clone(), BoxRoom::standard(11))
            .with_clock(self.clock.clone())
            .with_kind_policy(FIXED)
            .with_rng_seed(3);
        engine.init_garden();
        engine
    }
}

/// Throw a seed at the ceiling and let both anchor completions land.
fn plant_one(engine: &mut GardenEngine) -> EntityId {
    let before = engine.plant_ids();
    let seed = engine.spawn_seeds_at(&[Vec3::new(-2.0, 1.5, 0.0)])[0];
    let target = engine.throw_seed(seed).unwrap();
    engine.seed_landed_on_ceiling(seed, target).unwrap();
    engine.tick();
    engine.tick();
    engine
        .plant_ids()
        .into_iter()
        .find(|id| !before.contains(id))
        .expect("a new plant")
}

fn ticks(engine: &mut GardenEngine, n: usize) {
    for _ in 0..n {
        engine.tick();
    }
}

/// Standard templates for the given plant kinds only.
fn partial_catalog(plants: &[PlantKind], islands: bool) -> TemplateCatalog {
    let standard = TemplateCatalog::standard();
    let mut catalog = TemplateCatalog::empty();
    for kind in plants {
        catalog = catalog.with_plant(*kind, standard.plant(*kind).unwrap().clone());
    }
    if islands {
        for kind in IslandKind::all() {
            catalog = catalog.with_island(*kind, standard.island(*kind).unwrap().clone());
        }
    }
    catalog
}

// ── Seed → island → plant ──────────────────────────────────────────────

#[test]
fn thrown_seed_grows_an_island_then_a_plant() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let seed = engine.spawn_seeds_at(&[Vec3::new(2.0, 1.0, 0.0)])[0];

    let target = engine.throw_seed(seed).unwrap();
    assert_eq!(target.y, 3.0);
    assert_eq!(engine.flying_seeds(), vec![seed]);

    engine.seed_landed_on_ceiling(seed, target).unwrap();
    assert!(engine.seed(seed).is_none());
    assert_eq!(engine.book().pending_len(), 1);

    engine.tick();
    assert_eq!(engine.island_count(), 1);
    assert_eq!(engine.plant_count(), 0);
    assert_eq!(engine.book().pending_len(), 0);

    engine.tick();
    assert_eq!(engine.plant_count(), 1);
    let plant = engine.plant_ids()[0];
    assert_eq!(engine.plant_kind(plant), Some(PlantKind::KelpBoa));
    assert_eq!(engine.plant_growth(plant), Some(0.0));

    // Plant hangs from the island's attachment point
    let island = engine.island_ids()[0];
    let island_pos = engine.transform(island).unwrap().position;
    let plant_pos = engine.transform(plant).unwrap().position;
    assert!((plant_pos.y - (island_pos.y - 0.25)).abs() < 1e-4);

    let notes = engine.drain_notifications();
    assert!(notes
        .iter()
        .any(|n| matches!(n, Notification::SeedPoppedOnCeiling { seed: s, .. } if *s == seed)));
    assert!(notes
        .iter()
        .any(|n| matches!(n, Notification::IslandEmerged { island: i, .. } if *i == island)));
}

#[test]
fn new_plant_reaches_max_after_fifty_ticks_with_one_ready() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let plant = plant_one(&mut engine);
    engine.drain_notifications();

    ticks(&mut engine, 50);
    assert_eq!(engine.plant_growth(plant), Some(1.0));
    assert_eq!(engine.plant_state(plant), Some(GrowthState::FullyGrown));

    ticks(&mut engine, 30);
    let ready = engine
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::PlantReadyToHarvest { .. }))
        .count();
    assert_eq!(ready, 1);
}

#[test]
fn seed_on_existing_island_plants_immediately() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    plant_one(&mut engine);

    let seed = engine.spawn_seeds_at(&[Vec3::ZERO])[0];
    engine.throw_seed(seed).unwrap();
    let island = engine.island_ids()[0];
    let on_island = engine.transform(island).unwrap().position;
    engine.seed_landed_on_island(seed, on_island).unwrap();

    engine.tick();
    assert_eq!(engine.island_count(), 1);
    assert_eq!(engine.plant_count(), 2);
}

#[test]
fn seed_is_busy_until_it_lands() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let seed = engine.spawn_seeds_at(&[Vec3::ZERO])[0];

    let target = engine.throw_seed(seed).unwrap();
    assert_eq!(engine.throw_seed(seed), Err(GardenError::SeedBusy(seed)));

    engine.seed_landed_on_ceiling(seed, target).unwrap();
    assert_eq!(engine.throw_seed(seed), Err(GardenError::UnknownSeed(seed)));
    assert!(engine.seed_landed_on_island(seed, target).is_err());
}

#[test]
fn throw_with_no_ceiling_fails_and_leaves_seed_idle() {
    let rig = Rig::new();
    let room = BoxRoom::without_surfaces(2);
    let mut config = fast_config();
    config.placement.max_attempts_per_pose = 3;
    let mut engine = GardenEngine::new(config, rig.store(), rig.anchors.clone(), room)
        .with_kind_policy(FIXED);
    let seed = engine.spawn_seeds_at(&[Vec3::ZERO])[0];

    assert_eq!(engine.throw_seed(seed), Err(GardenError::PlacementFailed(seed)));
    assert_eq!(engine.idle_seeds(), vec![seed]);
    assert!(!engine.book().contains(seed));
}

#[test]
fn pop_random_seed_needs_an_idle_seed() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    assert_eq!(engine.pop_random_seed(), Err(GardenError::NoIdleSeeds));

    let spawned = engine.spawn_seeds_on_walls();
    assert!(spawned.len() >= engine.config().placement.min_seeds_to_spawn);
    assert!(spawned.len() <= engine.config().placement.max_seeds_to_spawn);

    let (seed, _) = engine.pop_random_seed().unwrap();
    assert!(spawned.contains(&seed));
    assert_eq!(engine.idle_seeds().len(), spawned.len() - 1);
}

// ── Anchor ordering ────────────────────────────────────────────────────

#[test]
fn islands_take_plantings_in_landing_order() {
    let rig = Rig::new();
    let mut engine = GardenEngine::new(fast_config(), rig.store(), rig.anchors.clone(), BoxRoom::standard(4))
        .with_kind_policy(ScriptedKinds(vec![PlantKind::BranchTrumpet, PlantKind::KelpBull]));
    let seeds = engine.spawn_seeds_at(&[Vec3::ZERO, Vec3::X]);

    rig.anchors.hold();
    for seed in &seeds {
        let target = engine.throw_seed(*seed).unwrap();
        engine.seed_landed_on_ceiling(*seed, target).unwrap();
    }
    assert_eq!(engine.book().pending_len(), 2);

    rig.anchors.release(1);
    engine.tick();
    assert_eq!(engine.island_count(), 1);
    assert_eq!(
        rig.anchors.created_templates().last(),
        Some(&Template::Plant(PlantKind::BranchTrumpet))
    );

    rig.anchors.resume();
    engine.tick();
    assert_eq!(engine.island_count(), 2);
    assert_eq!(
        rig.anchors.created_templates().last(),
        Some(&Template::Plant(PlantKind::KelpBull))
    );
    engine.tick();
    assert_eq!(engine.plant_count(), 2);
}

#[test]
fn failed_island_drops_oldest_planting() {
    let rig = Rig::new();
    let mut engine = GardenEngine::new(fast_config(), rig.store(), rig.anchors.clone(), BoxRoom::standard(4))
        .with_kind_policy(ScriptedKinds(vec![PlantKind::BranchTrumpet, PlantKind::KelpBull]));
    let seeds = engine.spawn_seeds_at(&[Vec3::ZERO, Vec3::X]);

    rig.anchors.fail_next_creates(1);
    for seed in &seeds {
        let target = engine.throw_seed(*seed).unwrap();
        engine.seed_landed_on_ceiling(*seed, target).unwrap();
    }

    engine.tick();
    assert_eq!(engine.island_count(), 1);
    assert_eq!(engine.book().pending_len(), 0);
    assert_eq!(
        rig.anchors.created_templates().last(),
        Some(&Template::Plant(PlantKind::KelpBull))
    );
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn reload_applies_offline_growth() {
    let rig = Rig::new();
    let mut anchors = rig.anchors.clone();
    anchors.create(Template::Plant(PlantKind::BranchA), Vec3::ZERO, Quat::IDENTITY);
    let id = match anchors.poll().pop() {
        Some(AnchorEvent::Created { id: Some(id), .. }) => id,
        other => panic!("unexpected {:?}", other),
    };

    let mut store = rig.store();
    store.upsert_plant(PlantRecord {
        id,
        kind: PlantKind::BranchA,
        growth: 0.4,
        created_at: rig.clock.now(),
    });
    store.stamp_visit(rig.clock.now());
    assert!(store.save());

    // Two hours away, default two-day life span, quarter speed offline
    rig.clock.advance(Duration::seconds(7200));
    let mut engine = rig.engine(GardenConfig::default());
    engine.tick();

    let growth = engine.plant_growth(id).unwrap();
    let expected = 0.4 + 7200.0 / 172_800.0 * 0.25;
    assert!((growth - expected).abs() < 1e-5, "growth {}", growth);
    assert_eq!(engine.plant_state(id), Some(GrowthState::Growing));
}

#[test]
fn long_absence_clamps_growth_and_starts_dull() {
    let rig = Rig::new();
    let mut engine = rig.engine(GardenConfig::default());
    let plant = plant_one(&mut engine);
    assert!(engine.shutdown());
    drop(engine);

    rig.clock.advance(Duration::days(30));
    let mut engine = rig.engine(GardenConfig::default());
    engine.tick();
    assert_eq!(engine.plant_growth(plant), Some(1.0));
    assert!(matches!(engine.plant_state(plant), Some(GrowthState::Dull { .. })));

    // Three-second dull delay, then the ready edge
    ticks(&mut engine, 31);
    let notes = engine.drain_notifications();
    assert!(notes.contains(&Notification::PlantAwake { plant }));
    assert!(notes.contains(&Notification::PlantReadyToHarvest { plant }));
    assert_eq!(engine.plant_state(plant), Some(GrowthState::FullyGrown));
}

#[test]
fn garden_round_trips_through_disk() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let plants: Vec<EntityId> = (0..3).map(|_| plant_one(&mut engine)).collect();
    ticks(&mut engine, 10);
    let growth: Vec<f32> = plants.iter().map(|p| engine.plant_growth(*p).unwrap()).collect();
    let islands = engine.island_ids();
    assert!(engine.shutdown());
    drop(engine);

    let mut engine = rig.engine(fast_config());
    engine.tick();
    assert_eq!(engine.island_ids(), islands);
    for (plant, before) in plants.iter().zip(growth) {
        let after = engine.plant_growth(*plant).unwrap();
        assert!((after - before).abs() < 1e-5);
        assert_eq!(engine.plant_kind(*plant), Some(PlantKind::KelpBoa));
    }
}

#[test]
fn empty_garden_saves_and_reloads_empty() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    assert!(engine.save());
    drop(engine);

    let mut engine = rig.engine(fast_config());
    engine.tick();
    assert_eq!(engine.plant_count(), 0);
    assert!(engine.store().snapshot().is_empty());
    assert!(engine.store().snapshot().last_visit().is_some());
}

#[test]
fn corrupt_save_loads_as_empty_garden() {
    let rig = Rig::new();
    std::fs::write(rig.dir.path().join("GardenData.json"), "{ not json").unwrap();

    let mut engine = rig.engine(fast_config());
    engine.tick();
    assert!(engine.store().snapshot().is_empty());
    assert!(!rig
        .anchors
        .requests()
        .iter()
        .any(|r| matches!(r, AnchorRequest::Load { .. })));

    // A fresh save replaces the corrupt file
    plant_one(&mut engine);
    assert!(engine.save());
    let mut store = rig.store();
    assert_eq!(store.load().plant_map.len(), 1);
}

#[test]
fn duplicate_load_is_skipped() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    plant_one(&mut engine);
    assert!(engine.save());
    drop(engine);

    let mut engine = rig.engine(fast_config());
    engine.init_garden();
    engine.tick();
    assert_eq!(engine.plant_count(), 1);
    assert_eq!(engine.island_count(), 1);
}

#[test]
fn destroy_garden_erases_everything() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    plant_one(&mut engine);
    let flying = engine.spawn_seeds_at(&[Vec3::ZERO])[0];
    engine.throw_seed(flying).unwrap();

    engine.destroy_garden();
    engine.tick();
    assert_eq!(engine.plant_count(), 0);
    assert_eq!(engine.island_count(), 0);
    assert_eq!(engine.idle_seeds(), vec![flying]);
    assert!(engine.book().pending().next().is_none());
    assert_eq!(rig.anchors.stored_count(), 0);

    let mut store = rig.store();
    assert!(store.load().is_empty());
}

#[test]
fn creations_in_flight_do_not_outlive_destroy_garden() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    plant_one(&mut engine);

    // One plant creation and one island creation still queued
    let on_island = engine.spawn_seeds_at(&[Vec3::ZERO])[0];
    engine.throw_seed(on_island).unwrap();
    let island = engine.island_ids()[0];
    let island_pos = engine.transform(island).unwrap().position;
    engine.seed_landed_on_island(on_island, island_pos).unwrap();
    let on_ceiling = engine.spawn_seeds_at(&[Vec3::X])[0];
    let target = engine.throw_seed(on_ceiling).unwrap();
    engine.seed_landed_on_ceiling(on_ceiling, target).unwrap();

    engine.destroy_garden();
    ticks(&mut engine, 3);
    assert_eq!(engine.island_count(), 0);
    assert_eq!(engine.plant_count(), 0);
    assert!(engine.save());
    assert_eq!(rig.anchors.stored_count(), 0);
    assert!(rig.store().load().is_empty());

    // Requests made after the destroy complete normally
    plant_one(&mut engine);
    assert_eq!(engine.island_count(), 1);
    assert_eq!(engine.plant_count(), 1);
    assert_eq!(rig.anchors.stored_count(), 2);
}

// ── Charge & harvest ───────────────────────────────────────────────────

#[test]
fn charge_requires_full_growth() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let plant = plant_one(&mut engine);

    assert_eq!(engine.begin_charge(plant), Err(GardenError::NotFullyGrown(plant)));
    let stranger = EntityId::new_v4();
    assert_eq!(engine.begin_charge(stranger), Err(GardenError::UnknownEntity(stranger)));
}

#[test]
fn full_charge_releases_seeds_and_regrows() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let plant = plant_one(&mut engine);
    ticks(&mut engine, 50);
    engine.drain_notifications();

    engine.begin_charge(plant).unwrap();
    engine.begin_charge(plant).unwrap();
    // 0.5 charge per second, plus one tick of float slack
    ticks(&mut engine, 21);

    let notes = engine.drain_notifications();
    let charging_up = notes
        .iter()
        .filter(|n| matches!(n, Notification::PlantChargingUp { .. }))
        .count();
    assert_eq!(charging_up, 1);
    let released = notes.iter().find_map(|n| match n {
        Notification::SeedSpawnedFromPlant { plant: p, seeds } if *p == plant => Some(*seeds),
        _ => None,
    });
    let released = released.expect("harvest");
    assert!((2..=5).contains(&released));
    assert_eq!(engine.idle_seeds().len(), released);
    assert!(matches!(engine.plant_state(plant), Some(GrowthState::Cooldown { .. })));

    // Ten-second cooldown, then a fresh cycle
    ticks(&mut engine, 101);
    assert!(engine.drain_notifications().contains(&Notification::PlantRegrowing { plant }));
    assert_eq!(engine.plant_state(plant), Some(GrowthState::Growing));
}

#[test]
fn released_charge_decays() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let plant = plant_one(&mut engine);
    ticks(&mut engine, 50);

    engine.begin_charge(plant).unwrap();
    ticks(&mut engine, 10);
    assert!(engine.plant_charge(plant).unwrap() > 0.4);
    engine.end_charge(plant).unwrap();
    ticks(&mut engine, 10);
    assert_eq!(engine.plant_charge(plant), Some(0.0));
    assert_eq!(engine.plant_state(plant), Some(GrowthState::FullyGrown));
}

#[test]
fn destroy_policy_removes_harvested_plant() {
    let rig = Rig::new();
    let mut config = fast_config();
    config.harvest.policy = HarvestPolicy::Destroy;
    let mut engine = rig.engine(config);
    let plant = plant_one(&mut engine);
    ticks(&mut engine, 50);

    engine.begin_charge(plant).unwrap();
    ticks(&mut engine, 21);
    assert!(!engine.is_live(plant));
    engine.tick();
    assert!(engine.store().plant(plant).is_none());
    assert!(!rig.anchors.is_stored(plant));
    assert!(!engine.idle_seeds().is_empty());
}

#[test]
fn failed_erase_keeps_harvested_plant_for_next_session() {
    let rig = Rig::new();
    let mut config = fast_config();
    config.harvest.policy = HarvestPolicy::Destroy;
    let mut engine = rig.engine(config.clone());
    let plant = plant_one(&mut engine);
    ticks(&mut engine, 50);

    rig.anchors.fail_next_erases(1);
    engine.begin_charge(plant).unwrap();
    ticks(&mut engine, 22);
    assert!(!engine.is_live(plant));
    assert!(engine.store().plant(plant).is_some());
    assert!(engine.shutdown());

    let mut next = rig.engine(config);
    next.tick();
    assert!(next.is_live(plant));
}

#[test]
fn scoped_listener_is_dropped_with_its_plant() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let plant = plant_one(&mut engine);
    engine.notifications().subscribe_scoped(plant, |_| {});
    assert_eq!(engine.notifications().subscription_count(), 1);

    engine.destroy_plant(plant).unwrap();
    assert_eq!(engine.notifications().subscription_count(), 0);
    assert_eq!(engine.destroy_plant(plant), Err(GardenError::UnknownEntity(plant)));
}

// ── Merging ────────────────────────────────────────────────────────────

#[test]
fn equal_seeds_merge_and_uneven_ones_bounce() {
    let rig = Rig::new();
    let mut engine = rig.engine(fast_config());
    let seeds = engine.spawn_seeds_at(&[Vec3::ZERO, Vec3::X, Vec3::Z]);

    let absorbed = engine.seeds_touched(seeds[0], seeds[1]).unwrap();
    let survivor = if absorbed == seeds[0] { seeds[1] } else { seeds[0] };
    assert!(engine.seed(absorbed).is_none());
    assert!((engine.seed(survivor).unwrap().scale() - 0.2).abs() < 1e-6);

    assert_eq!(engine.seeds_touched(survivor, seeds[2]), None);
    assert_eq!(engine.seeds_touched(survivor, survivor), None);
    assert_eq!(engine.idle_seeds().len(), 2);

    // The absorbed seed went back to the pool exactly once
    assert_eq!(engine.seeds_touched(absorbed, seeds[2]), None);
    assert_eq!(engine.pool().borrowed_count(), 2);
    assert_eq!(engine.pool().free_count() + 2, engine.pool().created_count());
}

// ── Missing templates ──────────────────────────────────────────────────

#[test]
fn throw_without_plant_template_fails_and_others_keep_growing() {
    let rig = Rig::new();
    let mut engine = rig
        .engine(fast_config())
        .with_catalog(partial_catalog(&[PlantKind::KelpBoa], true))
        .with_kind_policy(ScriptedKinds(vec![PlantKind::KelpBoa, PlantKind::BranchA]));
    let plant = plant_one(&mut engine);

    let seed = engine.spawn_seeds_at(&[Vec3::ZERO])[0];
    assert_eq!(
        engine.throw_seed(seed),
        Err(GardenError::MissingTemplate("plant BranchA".to_string()))
    );
    assert!(!engine.book().contains(seed));
    assert_eq!(engine.idle_seeds(), vec![seed]);

    ticks(&mut engine, 10);
    assert!(engine.plant_growth(plant).unwrap() > 0.0);
}

#[test]
fn landing_without_island_template_drops_the_planting() {
    let rig = Rig::new();
    let mut engine = rig
        .engine(fast_config())
        .with_catalog(partial_catalog(PlantKind::all(), false));
    let seed = engine.spawn_seeds_at(&[Vec3::ZERO])[0];
    let target = engine.throw_seed(seed).unwrap();

    assert_eq!(
        engine.seed_landed_on_ceiling(seed, target),
        Err(GardenError::MissingTemplate("island BigIsland".to_string()))
    );
    assert!(!engine.book().contains(seed));
    assert_eq!(engine.book().pending_len(), 0);
    assert!(engine.seed(seed).is_none());
    assert!(rig.anchors.created_templates().is_empty());

    engine.tick();
    assert_eq!(engine.island_count(), 0);
}

#[test]
fn harvest_without_plant_template_drops_nothing() {
    let rig = Rig::new();
    let mut anchors = rig.anchors.clone();
    anchors.create(Template::Plant(PlantKind::BranchA), Vec3::ZERO, Quat::IDENTITY);
    let id = match anchors.poll().pop() {
        Some(AnchorEvent::Created { id: Some(id), .. }) => id,
        other => panic!("unexpected {:?}", other),
    };
    let mut store = rig.store();
    store.upsert_plant(PlantRecord {
        id,
        kind: PlantKind::BranchA,
        growth: 1.0,
        created_at: rig.clock.now(),
    });
    store.stamp_visit(rig.clock.now());
    assert!(store.save());

    let mut engine = rig
        .engine(fast_config())
        .with_catalog(partial_catalog(&[PlantKind::KelpBoa], true));
    ticks(&mut engine, 2);
    assert_eq!(engine.plant_state(id), Some(GrowthState::FullyGrown));

    engine.begin_charge(id).unwrap();
    ticks(&mut engine, 21);
    assert!(engine.is_live(id));
    assert!(matches!(engine.plant_state(id), Some(GrowthState::Cooldown { .. })));
    assert!(engine.idle_seeds().is_empty());
    assert!(!engine
        .drain_notifications()
        .iter()
        .any(|n| matches!(n, Notification::SeedSpawnedFromPlant { .. })));
}

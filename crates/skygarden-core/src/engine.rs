//! Garden engine - owns the world, the store, and every collaborator.
//!
//! The host drives it with [`GardenEngine::update`] once per frame and
//! reports seed collisions through the lifecycle handlers in
//! [`crate::lifecycle`]. Everything runs on the caller's thread.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use skygarden_logic::config::{GameMode, GardenConfig};
use skygarden_logic::growth::{GrowthContext, GrowthSimulator, GrowthState};
use skygarden_logic::kinds::{IslandKind, KindPolicy, PlantKind, RandomKinds};
use skygarden_logic::math::Vec3;
use skygarden_logic::placement::RoomQuery;
use skygarden_logic::pool::Pool;

use crate::anchors::{AnchorService, CreateTracker};
use crate::catalog::TemplateCatalog;
use crate::clock::{Clock, SystemClock};
use crate::components::*;
use crate::notify::{Notification, NotificationHub};
use crate::persistence::GardenStore;
use crate::planting::PlantingBook;
use crate::systems::growth_system;

/// Smallest tick interval `update` will step with.
const MIN_TICK_INTERVAL: f32 = 0.001;

pub struct GardenEngine {
    /// Live plants and islands
    pub world: World,
    pub(crate) index: HashMap<EntityId, Entity>,
    pub(crate) store: GardenStore,
    pub(crate) anchors: Box<dyn AnchorService>,
    pub(crate) creates: CreateTracker,
    pub(crate) room: Box<dyn RoomQuery>,
    pub(crate) catalog: TemplateCatalog,
    pub(crate) config: GardenConfig,
    pub(crate) mode: GameMode,
    pub(crate) hub: NotificationHub,
    pub(crate) pool: Pool<Seed>,
    /// Seeds currently out of the pool, idle or flying
    pub(crate) seeds: BTreeMap<SeedId, Seed>,
    pub(crate) book: PlantingBook,
    pub(crate) kinds: Box<dyn KindPolicy>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) rng: StdRng,
    /// Offline seconds since the previous session, used for loaded plants
    pub(crate) offline_elapsed: Option<f64>,
    next_seed: u64,
    accumulator: f32,
    ticks: u64,
}

impl GardenEngine {
    pub fn new(
        config: GardenConfig,
        store: GardenStore,
        anchors: impl AnchorService + 'static,
        room: impl RoomQuery + 'static,
    ) -> Self {
        for problem in config.validate() {
            log::warn!("config: {}", problem);
        }

        let seed_scale = config.seeds.scale;
        let pool = Pool::initialize(
            move |slot| Seed::new(slot, seed_scale),
            config.placement.max_seeds_to_spawn,
        );

        Self {
            world: World::new(),
            index: HashMap::new(),
            store,
            anchors: Box::new(anchors),
            creates: CreateTracker::new(),
            room: Box::new(room),
            catalog: TemplateCatalog::standard(),
            config,
            mode: GameMode::default(),
            hub: NotificationHub::new(),
            pool,
            seeds: BTreeMap::new(),
            book: PlantingBook::new(),
            kinds: Box::new(RandomKinds::new()),
            clock: Box::new(SystemClock),
            rng: StdRng::from_entropy(),
            offline_elapsed: None,
            next_seed: 1,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    pub fn with_catalog(mut self, catalog: TemplateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_kind_policy(mut self, policy: impl KindPolicy + 'static) -> Self {
        self.kinds = Box::new(policy);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Deterministic loot and seed-count rolls.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ── Ticking ────────────────────────────────────────────────────────────

    /// Advance by `delta_seconds` of frame time, in whole ticks.
    pub fn update(&mut self, delta_seconds: f32) {
        let interval = self.config.modes.tick_interval_seconds.max(MIN_TICK_INTERVAL);
        self.accumulator += delta_seconds.max(0.0);
        while self.accumulator >= interval {
            self.accumulator -= interval;
            self.tick();
        }
    }

    /// One simulation tick: grow plants, then apply anchor completions.
    ///
    /// Entities created by this tick's completions start growing next tick.
    pub fn tick(&mut self) {
        let ctx = self.growth_context();
        for (plant, event) in growth_system(&mut self.world, &ctx) {
            self.on_growth_event(plant, event);
        }
        for event in self.anchors.poll() {
            self.on_anchor_event(event);
        }
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn growth_context(&self) -> GrowthContext {
        self.config.growth_context(self.mode)
    }

    // ── Mode & config ──────────────────────────────────────────────────────

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        if mode != self.mode {
            log::info!(
                "mode {:?} -> {:?} (growth x{})",
                self.mode,
                mode,
                self.config.modes.speed_for(mode)
            );
            self.mode = mode;
        }
    }

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &GardenStore {
        &self.store
    }

    pub fn book(&self) -> &PlantingBook {
        &self.book
    }

    pub fn pool(&self) -> &Pool<Seed> {
        &self.pool
    }

    pub fn notifications(&mut self) -> &mut NotificationHub {
        &mut self.hub
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.hub.drain()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Queries ────────────────────────────────────────────────────────────

    pub fn plant_count(&self) -> usize {
        self.world.query::<&Plant>().iter().count()
    }

    pub fn island_count(&self) -> usize {
        self.world.query::<&Island>().iter().count()
    }

    pub fn plant_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .world
            .query::<(&Anchor, &Plant)>()
            .iter()
            .map(|(_, (anchor, _))| anchor.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn island_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .world
            .query::<(&Anchor, &Island)>()
            .iter()
            .map(|(_, (anchor, _))| anchor.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn plant_kind(&self, id: EntityId) -> Option<PlantKind> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&Plant>(entity).ok().map(|p| p.kind)
    }

    pub fn island_kind(&self, id: EntityId) -> Option<IslandKind> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&Island>(entity).ok().map(|i| i.kind)
    }

    pub fn plant_growth(&self, id: EntityId) -> Option<f32> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&GrowthSimulator>(entity).ok().map(|s| s.growth())
    }

    pub fn plant_state(&self, id: EntityId) -> Option<GrowthState> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&GrowthSimulator>(entity).ok().map(|s| s.state())
    }

    pub fn plant_charge(&self, id: EntityId) -> Option<f32> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&GrowthSimulator>(entity).ok().map(|s| s.charge())
    }

    pub fn transform(&self, id: EntityId) -> Option<Transform> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    pub fn seed(&self, id: SeedId) -> Option<&Seed> {
        self.seeds.get(&id)
    }

    pub fn idle_seeds(&self) -> Vec<SeedId> {
        self.seeds
            .values()
            .filter(|s| !s.is_flying())
            .map(|s| s.id)
            .collect()
    }

    pub fn flying_seeds(&self) -> Vec<SeedId> {
        self.seeds
            .values()
            .filter(|s| s.is_flying())
            .map(|s| s.id)
            .collect()
    }

    // ── Entity bookkeeping ─────────────────────────────────────────────────

    pub(crate) fn spawn_plant(
        &mut self,
        id: EntityId,
        kind: PlantKind,
        created_at: DateTime<Utc>,
        transform: Transform,
        growth: GrowthSimulator,
    ) {
        let entity = self
            .world
            .spawn((Anchor { id }, Plant { kind, created_at }, transform, growth));
        self.index.insert(id, entity);
    }

    pub(crate) fn spawn_island(&mut self, id: EntityId, kind: IslandKind, transform: Transform) {
        let entity = self.world.spawn((Anchor { id }, Island { kind }, transform));
        self.index.insert(id, entity);
    }

    /// Tear down a live entity: stop its sequences and drop its listeners.
    pub(crate) fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.index.remove(&id) else {
            return false;
        };
        if let Ok(mut sim) = self.world.get::<&mut GrowthSimulator>(entity) {
            sim.cancel();
        }
        if self.world.despawn(entity).is_err() {
            log::error!("index pointed {} at a dead entity", id);
        }
        self.hub.release_owner(id);
        true
    }

    pub(crate) fn despawn_all(&mut self) {
        let ids: Vec<EntityId> = self.index.keys().copied().collect();
        for id in ids {
            self.despawn(id);
        }
    }

    /// Take a seed from the pool with a fresh throw identity.
    pub(crate) fn borrow_seed(&mut self, position: Vec3) -> SeedId {
        let mut seed = self.pool.borrow();
        seed.id = SeedId(self.next_seed);
        self.next_seed += 1;
        seed.position = position;
        seed.state = SeedState::Idle;
        let id = seed.id;
        self.seeds.insert(id, seed);
        id
    }

    /// Put a seed back in the pool and forget any planting still in flight.
    pub(crate) fn release_seed(&mut self, id: SeedId) -> bool {
        let Some(seed) = self.seeds.remove(&id) else {
            return false;
        };
        self.book.take(id);
        if let Err(seed) = self.pool.return_item(seed) {
            log::error!("pool refused seed slot {}", seed.slot());
        }
        true
    }
}

impl std::fmt::Debug for GardenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GardenEngine")
            .field("plants", &self.plant_count())
            .field("islands", &self.island_count())
            .field("seeds", &self.seeds.len())
            .field("mode", &self.mode)
            .field("ticks", &self.ticks)
            .finish()
    }
}

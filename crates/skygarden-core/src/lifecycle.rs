//! Seed → island → plant lifecycle, session start/end, and harvest.
//!
//! A thrown seed resolves a ceiling pose and leaves a [`Planting`]. Landing
//! on the ceiling asks for an island and queues the planting; each island
//! that emerges takes the oldest queued planting and asks for its plant.
//! Landing on an existing island asks for the plant right away.

use rand::Rng;

use skygarden_logic::config::HarvestPolicy;
use skygarden_logic::growth::{GrowthEvent, GrowthSimulator};
use skygarden_logic::kinds::{IslandKind, PlantKind};
use skygarden_logic::math::{Bounds, Quat, Vec3};
use skygarden_logic::mergeable::{try_absorb, MergeOutcome};
use skygarden_logic::placement::{find_poses, LayerMask, PlacementRequest, SpawnLocation, SurfaceLabels};

use crate::anchors::{AnchorEvent, Template};
use crate::clock::whole_seconds;
use crate::components::{EntityId, SeedId, SeedState, Transform};
use crate::engine::GardenEngine;
use crate::error::GardenError;
use crate::notify::Notification;
use crate::persistence::{humanize, IslandRecord, PlantRecord};
use crate::planting::Planting;
use crate::systems::snapshot_system;

impl GardenEngine {
    // ── Session ────────────────────────────────────────────────────────────

    /// Load the store and ask the anchor service for every persisted
    /// entity, one batch per kind.
    pub fn init_garden(&mut self) {
        self.store.load();

        let now = self.now();
        let since = self.store.time_since_last_visit(now);
        match since {
            Some(duration) => log::info!("time since last garden visit: {}", humanize(duration)),
            None => log::info!("no previous garden visit recorded"),
        }
        self.offline_elapsed = since.map(|d| d.num_milliseconds() as f64 / 1000.0);

        for (kind, ids) in self.store.islands_by_kind() {
            log::debug!("loading {} {:?} islands", ids.len(), kind);
            self.anchors.load_by_ids(Template::Island(kind), &ids);
        }
        for (kind, ids) in self.store.plants_by_kind() {
            log::debug!("loading {} {:?} plants", ids.len(), kind);
            self.anchors.load_by_ids(Template::Plant(kind), &ids);
        }
    }

    /// Merge every live entity into the store, stamp the visit, persist.
    pub fn save(&mut self) -> bool {
        let (plants, islands) = snapshot_system(&self.world);
        for record in plants {
            self.store.upsert_plant(record);
        }
        for record in islands {
            self.store.upsert_island(record);
        }
        let now = self.now();
        self.store.stamp_visit(now);
        self.store.save()
    }

    /// Session end.
    pub fn shutdown(&mut self) -> bool {
        log::info!(
            "garden session ending after {} ticks: {} plants, {} islands",
            self.ticks(),
            self.plant_count(),
            self.island_count()
        );
        self.save()
    }

    /// Erase every durable entity and persist an empty garden.
    ///
    /// Creations still in flight are erased as soon as they complete.
    pub fn destroy_garden(&mut self) {
        log::info!(
            "destroying garden: {} plants, {} islands, {} creations in flight",
            self.plant_count(),
            self.island_count(),
            self.creates.pending()
        );
        self.creates.invalidate();
        self.despawn_all();
        self.book.clear();
        for seed in self.seeds.values_mut() {
            seed.state = SeedState::Idle;
        }
        self.anchors.erase_all();
        self.store.clear();
    }

    // ── Seeds ──────────────────────────────────────────────────────────────

    /// Place idle seeds at the given world points.
    pub fn spawn_seeds_at(&mut self, points: &[Vec3]) -> Vec<SeedId> {
        points.iter().map(|p| self.borrow_seed(*p)).collect()
    }

    /// Scatter a random number of idle seeds across the walls.
    pub fn spawn_seeds_on_walls(&mut self) -> Vec<SeedId> {
        let placement = &self.config.placement;
        let max = placement.max_seeds_to_spawn;
        let min = placement.min_seeds_to_spawn.min(max);
        let count = self.rng.gen_range(min..=max);

        let request = PlacementRequest::new(Some(self.catalog.seed_bounds), count, SpawnLocation::AnySurface)
            .with_labels(SurfaceLabels::WALLS)
            .with_clearance(placement.seed_wall_clearance)
            .with_max_attempts(placement.max_attempts_per_pose);
        let points: Vec<Vec3> = find_poses(self.room.as_mut(), &request)
            .iter()
            .filter_map(|c| c.pose())
            .map(|(position, _)| position)
            .collect();

        if points.len() < count {
            log::debug!("placed {} of {} wall seeds", points.len(), count);
        }
        self.spawn_seeds_at(&points)
    }

    /// Throw an idle seed: resolve its ceiling pose and record the planting.
    /// Returns the point the seed should steer toward.
    pub fn throw_seed(&mut self, seed: SeedId) -> Result<Vec3, GardenError> {
        let size = self
            .seeds
            .get(&seed)
            .map(|s| s.scale())
            .ok_or(GardenError::UnknownSeed(seed))?;
        if self.book.contains(seed) {
            return Err(GardenError::SeedBusy(seed));
        }

        let kind = self.kinds.choose_plant(size);
        let bounds = self.plant_template_bounds(kind)?;
        let request = PlacementRequest::new(Some(bounds), 1, SpawnLocation::HangingDown)
            .with_labels(SurfaceLabels::CEILING)
            .avoiding(LayerMask::ISLANDS)
            .with_clearance(self.config.placement.clearance_distance)
            .with_max_attempts(self.config.placement.max_attempts_per_pose);

        let pose = find_poses(self.room.as_mut(), &request)
            .first()
            .and_then(|c| c.pose());
        let Some((position, orientation)) = pose else {
            log::warn!("{} has nowhere to land on the ceiling", seed);
            return Err(GardenError::PlacementFailed(seed));
        };

        self.book.insert(Planting {
            seed,
            kind,
            position,
            orientation,
        })?;
        if let Some(s) = self.seeds.get_mut(&seed) {
            s.state = SeedState::Flying { target: position };
        }
        log::debug!("{} thrown as {:?}, target {:?}", seed, kind, position);
        Ok(position)
    }

    /// Throw a random idle seed.
    pub fn pop_random_seed(&mut self) -> Result<(SeedId, Vec3), GardenError> {
        let idle = self.idle_seeds();
        if idle.is_empty() {
            return Err(GardenError::NoIdleSeeds);
        }
        let seed = idle[self.rng.gen_range(0..idle.len())];
        self.throw_seed(seed).map(|target| (seed, target))
    }

    /// A flying seed hit the ceiling: request its island and queue the planting.
    pub fn seed_landed_on_ceiling(&mut self, seed: SeedId, point: Vec3) -> Result<(), GardenError> {
        if !self.seeds.contains_key(&seed) {
            log::warn!("unknown {} landed on the ceiling", seed);
            return Err(GardenError::UnknownSeed(seed));
        }
        self.hub.emit(Notification::SeedPoppedOnCeiling {
            seed,
            position: point,
        });
        let result = self.request_island(seed, point);
        self.release_seed(seed);
        result
    }

    /// A flying seed hit an existing island: request its plant right away.
    pub fn seed_landed_on_island(&mut self, seed: SeedId, point: Vec3) -> Result<(), GardenError> {
        if !self.seeds.contains_key(&seed) {
            log::warn!("unknown {} landed on an island", seed);
            return Err(GardenError::UnknownSeed(seed));
        }
        self.hub.emit(Notification::SeedPoppedOnIsland {
            seed,
            position: point,
        });

        let result = match self.book.take(seed) {
            Some(planting) => self.plant_template_bounds(planting.kind).map(|_| {
                self.request_create(Template::Plant(planting.kind), point, planting.orientation);
            }),
            None => {
                log::error!("{} landed on an island without a planting", seed);
                Err(GardenError::UnknownSeed(seed))
            }
        };
        self.release_seed(seed);
        result
    }

    /// Two seeds touched. The one allowed to absorb the other does; the
    /// absorbed seed goes back to the pool. Returns the absorbed seed.
    pub fn seeds_touched(&mut self, a: SeedId, b: SeedId) -> Option<SeedId> {
        if a == b {
            return None;
        }
        let rule = self.config.seeds.merge_rule;
        let Some(mut first) = self.seeds.remove(&a) else {
            log::warn!("unknown {} touched {}", a, b);
            return None;
        };
        let Some(mut second) = self.seeds.remove(&b) else {
            log::warn!("unknown {} touched {}", b, a);
            self.seeds.insert(a, first);
            return None;
        };

        let (winner, loser) = if try_absorb(&mut first, &mut second, rule) == MergeOutcome::Absorbed {
            (first, second)
        } else if try_absorb(&mut second, &mut first, rule) == MergeOutcome::Absorbed {
            (second, first)
        } else {
            self.seeds.insert(a, first);
            self.seeds.insert(b, second);
            return None;
        };

        let (absorber, absorbed, scale) = (winner.id, loser.id, winner.scale());
        self.seeds.insert(absorber, winner);
        self.seeds.insert(absorbed, loser);
        self.release_seed(absorbed);
        self.hub.emit(Notification::SeedCombined {
            absorber,
            absorbed,
            scale,
        });
        Some(absorbed)
    }

    // ── Plants ─────────────────────────────────────────────────────────────

    /// Start charging a fully grown plant. Repeated calls while charging are no-ops.
    pub fn begin_charge(&mut self, plant: EntityId) -> Result<(), GardenError> {
        let (started, grown) = self.with_growth(plant, |sim| (sim.begin_charge(), sim.is_fully_grown()))?;
        if !started && !grown {
            return Err(GardenError::NotFullyGrown(plant));
        }
        Ok(())
    }

    pub fn end_charge(&mut self, plant: EntityId) -> Result<(), GardenError> {
        self.with_growth(plant, |sim| sim.end_charge())
    }

    /// Remove a plant and erase its anchor; the record goes once the erase lands.
    pub fn destroy_plant(&mut self, plant: EntityId) -> Result<(), GardenError> {
        if self.plant_kind(plant).is_none() || !self.despawn(plant) {
            return Err(GardenError::UnknownEntity(plant));
        }
        self.anchors.erase(plant);
        Ok(())
    }

    pub(crate) fn on_growth_event(&mut self, plant: EntityId, event: GrowthEvent) {
        let notification = match event {
            GrowthEvent::Ready => {
                log::info!("plant {} is ready to harvest", plant);
                Notification::PlantReadyToHarvest { plant }
            }
            GrowthEvent::ChargingUp => Notification::PlantChargingUp { plant },
            GrowthEvent::ChargingDown => Notification::PlantChargingDown { plant },
            GrowthEvent::GlowingBeforeSeedSpawn => Notification::PlantGlowingBeforeSeedSpawn { plant },
            GrowthEvent::DullEnded => Notification::PlantAwake { plant },
            GrowthEvent::Regrowing => Notification::PlantRegrowing { plant },
            GrowthEvent::SeedSpawned => {
                self.harvest(plant);
                return;
            }
        };
        self.hub.emit(notification);
    }

    /// Release seeds at a random subset of the plant's loot points, then
    /// apply the harvest policy.
    fn harvest(&mut self, plant: EntityId) {
        let (Some(kind), Some(transform)) = (self.plant_kind(plant), self.transform(plant)) else {
            log::warn!("harvest for unknown plant {}", plant);
            return;
        };
        let Some(template) = self.catalog.plant(kind) else {
            log::warn!("no template for {:?}, plant {} drops nothing", kind, plant);
            return;
        };

        let loot_points = template.loot_points.clone();
        let min_loot = template.min_loot.min(loot_points.len());
        let count = self.rng.gen_range(min_loot..=loot_points.len());
        let points: Vec<Vec3> = rand::seq::index::sample(&mut self.rng, loot_points.len(), count)
            .iter()
            .map(|i| transform.apply(loot_points[i]))
            .collect();
        let seeds = self.spawn_seeds_at(&points);

        log::info!("plant {} released {} seeds", plant, seeds.len());
        self.hub.emit(Notification::SeedSpawnedFromPlant {
            plant,
            seeds: seeds.len(),
        });

        match self.config.harvest.policy {
            HarvestPolicy::Regrow => {}
            HarvestPolicy::Destroy => {
                // The record stays until the erase is confirmed
                log::debug!("plant {} harvested for good, erasing its anchor", plant);
                if let Err(e) = self.destroy_plant(plant) {
                    log::error!("harvested plant vanished: {}", e);
                }
            }
        }
    }

    // ── Anchor completions ─────────────────────────────────────────────────

    pub(crate) fn on_anchor_event(&mut self, event: AnchorEvent) {
        if let AnchorEvent::Created { template, id, .. } = &event {
            if self.creates.completed(*template) {
                match id {
                    Some(id) => {
                        log::info!(
                            "{} {} was requested before the garden was destroyed, erasing",
                            template,
                            id
                        );
                        self.anchors.erase(*id);
                    }
                    None => log::debug!("stale {} creation failed", template),
                }
                return;
            }
        }
        match event {
            AnchorEvent::Created {
                template,
                id: Some(id),
                position,
                orientation,
            } => {
                let transform = Transform::new(position, orientation);
                match template {
                    Template::Island(kind) => self.island_created(id, kind, transform),
                    Template::Plant(kind) => self.plant_created(id, kind, transform),
                }
            }
            AnchorEvent::Created {
                template: Template::Island(kind),
                id: None,
                ..
            } => match self.book.pop_pending() {
                Some(planting) => log::error!(
                    "creating island {:?} failed, dropping planting of {}",
                    kind,
                    planting.seed
                ),
                None => log::error!("creating island {:?} failed", kind),
            },
            AnchorEvent::Created {
                template: Template::Plant(kind),
                id: None,
                ..
            } => log::error!("creating plant {:?} failed", kind),
            AnchorEvent::Loaded {
                template,
                id,
                position,
                orientation,
            } => self.anchor_loaded(template, id, Transform::new(position, orientation)),
            AnchorEvent::Erased { id, success: true } => {
                self.store.remove(id);
            }
            AnchorEvent::Erased { id, success: false } => {
                log::warn!(
                    "anchor {} could not be erased; record kept, it reloads next session",
                    id
                )
            }
            AnchorEvent::ErasedAll { success: true } => log::info!("all anchors erased"),
            AnchorEvent::ErasedAll { success: false } => log::warn!("erasing all anchors failed"),
        }
    }

    fn island_created(&mut self, id: EntityId, kind: IslandKind, transform: Transform) {
        if self.is_live(id) {
            log::warn!("island {} created twice, ignoring", id);
            return;
        }
        self.spawn_island(id, kind, transform);
        self.store.upsert_island(IslandRecord { id, kind });
        self.hub.emit(Notification::IslandEmerged {
            island: id,
            position: transform.position,
        });

        let Some(planting) = self.book.pop_pending() else {
            log::warn!("island {} emerged with no planting waiting", id);
            return;
        };
        let origin = match self.catalog.island(kind) {
            Some(template) => transform.apply(template.plant_origin),
            None => {
                log::warn!("no template for {:?}, planting at island origin", kind);
                transform.position
            }
        };
        log::debug!("island {} takes planting of {}", id, planting.seed);
        self.request_create(Template::Plant(planting.kind), origin, planting.orientation);
    }

    fn plant_created(&mut self, id: EntityId, kind: PlantKind, transform: Transform) {
        if self.is_live(id) {
            log::warn!("plant {} created twice, ignoring", id);
            return;
        }
        let mut growth = GrowthSimulator::new(self.config.growth.clone());
        growth.start_growing();
        let created_at = whole_seconds(self.now());
        self.store.upsert_plant(PlantRecord {
            id,
            kind,
            growth: growth.growth(),
            created_at,
        });
        self.spawn_plant(id, kind, created_at, transform, growth);
        log::info!("plant {} ({:?}) started growing", id, kind);
    }

    fn anchor_loaded(&mut self, template: Template, id: EntityId, transform: Transform) {
        if self.is_live(id) {
            log::warn!("{} {} is already live, skipping duplicate load", template, id);
            return;
        }
        match template {
            Template::Plant(_) => {
                let Some(record) = self.store.plant(id).cloned() else {
                    log::warn!("loaded plant {} has no record, skipping", id);
                    return;
                };
                let mut growth = GrowthSimulator::new(self.config.growth.clone());
                growth.resume_growing(record.growth, self.offline_elapsed, &self.growth_context());
                log::debug!(
                    "plant {} resumed at {:.3} (was {:.3})",
                    id,
                    growth.growth(),
                    record.growth
                );
                self.spawn_plant(id, record.kind, record.created_at, transform, growth);
            }
            Template::Island(_) => {
                let Some(record) = self.store.island(id).cloned() else {
                    log::warn!("loaded island {} has no record, skipping", id);
                    return;
                };
                self.spawn_island(id, record.kind, transform);
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────────

    /// Landing island orientation: a random yaw composed with the resolved pose.
    fn request_island(&mut self, seed: SeedId, point: Vec3) -> Result<(), GardenError> {
        if !self.book.is_in_flight(seed) {
            log::error!("{} landed on the ceiling without a planting", seed);
            return Err(GardenError::UnknownSeed(seed));
        }
        let kind = self.kinds.choose_island();
        if self.catalog.island(kind).is_none() {
            log::warn!("no template for island {:?}, dropping planting of {}", kind, seed);
            self.book.take(seed);
            return Err(GardenError::MissingTemplate(Template::Island(kind).to_string()));
        }
        let Some(planting) = self.book.promote(seed) else {
            return Err(GardenError::UnknownSeed(seed));
        };

        let yaw = Quat::from_yaw_degrees(self.kinds.island_yaw_degrees());
        self.request_create(Template::Island(kind), point, yaw * planting.orientation);
        Ok(())
    }

    fn request_create(&mut self, template: Template, position: Vec3, orientation: Quat) {
        self.creates.requested(template);
        self.anchors.create(template, position, orientation);
    }

    fn plant_template_bounds(&self, kind: PlantKind) -> Result<Bounds, GardenError> {
        match self.catalog.plant(kind) {
            Some(template) => Ok(template.bounds),
            None => {
                log::warn!("no template for plant {:?}", kind);
                Err(GardenError::MissingTemplate(Template::Plant(kind).to_string()))
            }
        }
    }

    fn with_growth<R>(
        &mut self,
        plant: EntityId,
        f: impl FnOnce(&mut GrowthSimulator) -> R,
    ) -> Result<R, GardenError> {
        let entity = *self
            .index
            .get(&plant)
            .ok_or(GardenError::UnknownEntity(plant))?;
        let (result, events) = {
            let mut sim = self
                .world
                .get::<&mut GrowthSimulator>(entity)
                .map_err(|_| GardenError::UnknownEntity(plant))?;
            let result = f(&mut *sim);
            (result, sim.drain_events())
        };
        for event in events {
            self.on_growth_event(plant, event);
        }
        Ok(result)
    }
}

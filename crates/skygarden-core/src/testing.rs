//! In-memory collaborators for headless runs and tests.
//!
//! [`BoxRoom`] is an axis-aligned room with labeled floor, ceiling, and
//! walls. [`MemoryAnchors`] keeps anchors in a shared ledger so a second
//! engine can "reopen" the same room. [`FixedClock`] is a settable clock.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use skygarden_logic::math::{Bounds, Quat, Vec3};
use skygarden_logic::placement::{LayerMask, RoomQuery, SurfaceLabels, SurfaceOrientation};

use crate::anchors::{AnchorEvent, AnchorService, Template};
use crate::clock::Clock;
use crate::components::EntityId;

// ── Room ───────────────────────────────────────────────────────────────────

/// Samples along a clearance ray.
const RAY_SAMPLES: u32 = 8;
const FLOATING_TRIES: u32 = 32;

#[derive(Debug, Clone)]
struct Surface {
    label: SurfaceLabels,
    orientation: SurfaceOrientation,
    center: Vec3,
    normal: Vec3,
    /// Half-size along the two in-plane axes
    u: Vec3,
    v: Vec3,
}

impl Surface {
    fn sample(&self, rng: &mut StdRng, min_radius: f32) -> Vec3 {
        let su = (1.0 - min_radius / self.u.length().max(f32::EPSILON)).max(0.0);
        let sv = (1.0 - min_radius / self.v.length().max(f32::EPSILON)).max(0.0);
        let a = rng.gen_range(-1.0f32..=1.0) * su;
        let b = rng.gen_range(-1.0f32..=1.0) * sv;
        self.center + self.u * a + self.v * b
    }
}

/// Axis-aligned room with optional furniture volumes and layered obstacles.
#[derive(Debug, Clone)]
pub struct BoxRoom {
    bounds: Bounds,
    surfaces: Vec<Surface>,
    volumes: Vec<Bounds>,
    obstacles: Vec<(Bounds, LayerMask)>,
    rng: StdRng,
}

impl BoxRoom {
    /// A 4m x 3m x 4m room with floor, ceiling, and four walls.
    pub fn standard(seed: u64) -> Self {
        Self::new(
            Bounds::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 3.0, 2.0)),
            seed,
        )
    }

    pub fn new(bounds: Bounds, seed: u64) -> Self {
        let c = bounds.center();
        let e = bounds.extents();
        let wall = |center: Vec3, normal: Vec3, u: Vec3| Surface {
            label: SurfaceLabels::WALL_FACE,
            orientation: SurfaceOrientation::VERTICAL,
            center,
            normal,
            u,
            v: Vec3::UP * e.y,
        };
        let surfaces = vec![
            Surface {
                label: SurfaceLabels::FLOOR,
                orientation: SurfaceOrientation::FACING_UP,
                center: Vec3::new(c.x, bounds.min.y, c.z),
                normal: Vec3::UP,
                u: Vec3::X * e.x,
                v: Vec3::Z * e.z,
            },
            Surface {
                label: SurfaceLabels::CEILING,
                orientation: SurfaceOrientation::FACING_DOWN,
                center: Vec3::new(c.x, bounds.max.y, c.z),
                normal: Vec3::DOWN,
                u: Vec3::X * e.x,
                v: Vec3::Z * e.z,
            },
            wall(Vec3::new(bounds.min.x, c.y, c.z), Vec3::X, Vec3::Z * e.z),
            wall(Vec3::new(bounds.max.x, c.y, c.z), -Vec3::X, Vec3::Z * e.z),
            wall(Vec3::new(c.x, c.y, bounds.min.z), Vec3::Z, Vec3::X * e.x),
            wall(Vec3::new(c.x, c.y, bounds.max.z), -Vec3::Z, Vec3::X * e.x),
        ];
        Self {
            bounds,
            surfaces,
            volumes: Vec::new(),
            obstacles: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The standard room with no usable surfaces at all.
    pub fn without_surfaces(seed: u64) -> Self {
        let mut room = Self::standard(seed);
        room.surfaces.clear();
        room
    }

    /// Keep only surfaces carrying one of `labels`.
    pub fn only(mut self, labels: SurfaceLabels) -> Self {
        self.surfaces.retain(|s| labels.intersects(s.label));
        self
    }

    /// Solid furniture volume.
    pub fn with_volume(mut self, volume: Bounds) -> Self {
        self.volumes.push(volume);
        self
    }

    /// Collider on the given layers.
    pub fn with_obstacle(mut self, obstacle: Bounds, layers: LayerMask) -> Self {
        self.obstacles.push((obstacle, layers));
        self
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn blocked(&self, point: Vec3) -> bool {
        !self.bounds.contains(&point)
            || self.volumes.iter().any(|v| v.contains(&point))
            || self.obstacles.iter().any(|(b, _)| b.contains(&point))
    }
}

impl RoomQuery for BoxRoom {
    fn random_point_in_room(&mut self, min_radius: f32) -> Option<Vec3> {
        let inner = Bounds::new(
            self.bounds.min + Vec3::splat(min_radius),
            self.bounds.max - Vec3::splat(min_radius),
        );
        if inner.min.x > inner.max.x || inner.min.y > inner.max.y || inner.min.z > inner.max.z {
            return None;
        }
        for _ in 0..FLOATING_TRIES {
            let point = Vec3::new(
                self.rng.gen_range(inner.min.x..=inner.max.x),
                self.rng.gen_range(inner.min.y..=inner.max.y),
                self.rng.gen_range(inner.min.z..=inner.max.z),
            );
            if !self.volumes.iter().any(|v| v.contains(&point)) {
                return Some(point);
            }
        }
        None
    }

    fn random_point_on_surface(
        &mut self,
        orientation: SurfaceOrientation,
        min_radius: f32,
        labels: SurfaceLabels,
    ) -> Option<(Vec3, Vec3)> {
        let matching: Vec<usize> = self
            .surfaces
            .iter()
            .enumerate()
            .filter(|(_, s)| orientation.intersects(s.orientation) && labels.intersects(s.label))
            .map(|(i, _)| i)
            .collect();
        if matching.is_empty() {
            return None;
        }
        let surface = self.surfaces[matching[self.rng.gen_range(0..matching.len())]].clone();
        Some((surface.sample(&mut self.rng, min_radius), surface.normal))
    }

    fn point_in_room(&self, point: Vec3) -> bool {
        self.bounds.contains(&point)
    }

    fn point_in_occluded_volume(&self, point: Vec3) -> bool {
        self.volumes.iter().any(|v| v.contains(&point))
    }

    fn raycast_clearance(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        let direction = direction.normalize();
        (1..=RAY_SAMPLES).any(|i| {
            let t = max_distance * i as f32 / RAY_SAMPLES as f32;
            self.blocked(origin + direction * t)
        })
    }

    fn box_overlap(&self, center: Vec3, extents: Vec3, orientation: Quat, layers: LayerMask) -> bool {
        // World AABB of the oriented box
        let axes = [
            orientation * (Vec3::X * extents.x),
            orientation * (Vec3::UP * extents.y),
            orientation * (Vec3::Z * extents.z),
        ];
        let half = axes.iter().fold(Vec3::ZERO, |acc, a| {
            acc + Vec3::new(a.x.abs(), a.y.abs(), a.z.abs())
        });
        let aabb = Bounds::from_center_extents(center, half);
        self.obstacles
            .iter()
            .any(|(b, l)| l.contains(layers) && b.intersects(&aabb))
    }
}

// ── Anchors ────────────────────────────────────────────────────────────────

/// A request the anchor service received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorRequest {
    Create {
        template: Template,
        position: Vec3,
        orientation: Quat,
    },
    Load {
        template: Template,
        ids: Vec<EntityId>,
    },
    Erase(EntityId),
    EraseAll,
}

#[derive(Debug, Clone, Copy)]
struct StoredAnchor {
    template: Template,
    position: Vec3,
    orientation: Quat,
}

#[derive(Debug, Default)]
struct Ledger {
    stored: HashMap<EntityId, StoredAnchor>,
    queued: VecDeque<AnchorEvent>,
    requests: Vec<AnchorRequest>,
    /// `None` delivers everything on poll
    budget: Option<usize>,
    failing_creates: usize,
    failing_erases: usize,
}

/// Anchor service backed by a shared in-memory ledger. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryAnchors {
    ledger: Rc<RefCell<Ledger>>,
}

impl MemoryAnchors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop delivering completions until released.
    pub fn hold(&self) {
        self.ledger.borrow_mut().budget = Some(0);
    }

    /// While held, allow `n` more completions through.
    pub fn release(&self, n: usize) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.budget = Some(ledger.budget.unwrap_or(0) + n);
    }

    /// Deliver everything again.
    pub fn resume(&self) {
        self.ledger.borrow_mut().budget = None;
    }

    /// The next `n` creations fail.
    pub fn fail_next_creates(&self, n: usize) {
        self.ledger.borrow_mut().failing_creates += n;
    }

    /// The next `n` erases fail and leave their anchors stored.
    pub fn fail_next_erases(&self, n: usize) {
        self.ledger.borrow_mut().failing_erases += n;
    }

    pub fn requests(&self) -> Vec<AnchorRequest> {
        self.ledger.borrow().requests.clone()
    }

    /// Templates of every creation request, in order.
    pub fn created_templates(&self) -> Vec<Template> {
        self.ledger
            .borrow()
            .requests
            .iter()
            .filter_map(|r| match r {
                AnchorRequest::Create { template, .. } => Some(*template),
                _ => None,
            })
            .collect()
    }

    pub fn stored_count(&self) -> usize {
        self.ledger.borrow().stored.len()
    }

    pub fn is_stored(&self, id: EntityId) -> bool {
        self.ledger.borrow().stored.contains_key(&id)
    }

    pub fn queued_count(&self) -> usize {
        self.ledger.borrow().queued.len()
    }
}

impl AnchorService for MemoryAnchors {
    fn create(&mut self, template: Template, position: Vec3, orientation: Quat) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.requests.push(AnchorRequest::Create {
            template,
            position,
            orientation,
        });
        let id = if ledger.failing_creates > 0 {
            ledger.failing_creates -= 1;
            None
        } else {
            let id = EntityId::new_v4();
            ledger.stored.insert(
                id,
                StoredAnchor {
                    template,
                    position,
                    orientation,
                },
            );
            Some(id)
        };
        ledger.queued.push_back(AnchorEvent::Created {
            template,
            id,
            position,
            orientation,
        });
    }

    fn load_by_ids(&mut self, template: Template, ids: &[EntityId]) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.requests.push(AnchorRequest::Load {
            template,
            ids: ids.to_vec(),
        });
        for id in ids {
            match ledger.stored.get(id).copied() {
                Some(anchor) if anchor.template == template => {
                    ledger.queued.push_back(AnchorEvent::Loaded {
                        template,
                        id: *id,
                        position: anchor.position,
                        orientation: anchor.orientation,
                    });
                }
                _ => log::warn!("memory anchors: no {} anchor {}", template, id),
            }
        }
    }

    fn erase(&mut self, id: EntityId) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.requests.push(AnchorRequest::Erase(id));
        let success = if ledger.failing_erases > 0 {
            ledger.failing_erases -= 1;
            false
        } else {
            ledger.stored.remove(&id).is_some()
        };
        ledger.queued.push_back(AnchorEvent::Erased { id, success });
    }

    fn erase_all(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.requests.push(AnchorRequest::EraseAll);
        ledger.stored.clear();
        ledger.queued.push_back(AnchorEvent::ErasedAll { success: true });
    }

    fn poll(&mut self) -> Vec<AnchorEvent> {
        let mut ledger = self.ledger.borrow_mut();
        let n = match ledger.budget {
            None => ledger.queued.len(),
            Some(budget) => budget.min(ledger.queued.len()),
        };
        if let Some(budget) = ledger.budget.as_mut() {
            *budget -= n;
        }
        ledger.queued.drain(..n).collect()
    }
}

// ── Clock ──────────────────────────────────────────────────────────────────

/// Settable clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(time)),
        }
    }

    /// 2023-11-14T22:13:20Z
    pub fn epoch() -> Self {
        Self::at(
            Utc.timestamp_opt(1_700_000_000, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }

    pub fn set(&self, time: DateTime<Utc>) {
        self.now.set(time);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skygarden_logic::kinds::{IslandKind, PlantKind};

    #[test]
    fn ceiling_points_face_down() {
        let mut room = BoxRoom::standard(5);
        for _ in 0..20 {
            let (point, normal) = room
                .random_point_on_surface(SurfaceOrientation::FACING_DOWN, 0.2, SurfaceLabels::CEILING)
                .unwrap();
            assert_eq!(normal, Vec3::DOWN);
            assert_eq!(point.y, 3.0);
            assert!(point.x.abs() <= 1.8 + 1e-5 && point.z.abs() <= 1.8 + 1e-5);
        }
    }

    #[test]
    fn walls_only_answer_vertical_queries() {
        let mut room = BoxRoom::standard(5).only(SurfaceLabels::WALLS);
        assert!(room
            .random_point_on_surface(SurfaceOrientation::FACING_DOWN, 0.0, SurfaceLabels::all())
            .is_none());
        let (_, normal) = room
            .random_point_on_surface(SurfaceOrientation::all(), 0.0, SurfaceLabels::WALLS)
            .unwrap();
        assert_eq!(normal.y, 0.0);
    }

    #[test]
    fn overlap_respects_layers() {
        let island = Bounds::from_center_extents(Vec3::new(0.0, 2.8, 0.0), Vec3::splat(0.2));
        let room = BoxRoom::standard(1).with_obstacle(island, LayerMask::ISLANDS);
        let center = Vec3::new(0.1, 2.8, 0.0);
        assert!(room.box_overlap(center, Vec3::splat(0.1), Quat::IDENTITY, LayerMask::ISLANDS));
        assert!(!room.box_overlap(center, Vec3::splat(0.1), Quat::IDENTITY, LayerMask::PLANTS));
    }

    #[test]
    fn clearance_ray_hits_furniture() {
        let table = Bounds::new(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 0.05, 0.5));
        let room = BoxRoom::standard(1).with_volume(table);
        assert!(room.raycast_clearance(Vec3::new(0.0, 3.0, 0.0), Vec3::DOWN, 3.0));
        assert!(!room.raycast_clearance(Vec3::new(0.0, 3.0, 0.0), Vec3::DOWN, 0.5));
    }

    #[test]
    fn anchors_complete_in_request_order_under_budget() {
        let mut anchors = MemoryAnchors::new();
        anchors.hold();
        anchors.create(Template::Island(IslandKind::BigIsland), Vec3::ZERO, Quat::IDENTITY);
        anchors.create(Template::Plant(PlantKind::KelpBoa), Vec3::ZERO, Quat::IDENTITY);
        assert!(anchors.poll().is_empty());

        anchors.release(1);
        let first = anchors.poll();
        assert!(matches!(
            first.as_slice(),
            [AnchorEvent::Created {
                template: Template::Island(_),
                id: Some(_),
                ..
            }]
        ));
        assert!(anchors.poll().is_empty());

        anchors.resume();
        assert_eq!(anchors.poll().len(), 1);
        assert_eq!(anchors.stored_count(), 2);
    }

    #[test]
    fn loads_only_matching_templates() {
        let mut anchors = MemoryAnchors::new();
        anchors.create(Template::Plant(PlantKind::BranchA), Vec3::ZERO, Quat::IDENTITY);
        let id = match anchors.poll().pop() {
            Some(AnchorEvent::Created { id: Some(id), .. }) => id,
            other => panic!("unexpected {:?}", other),
        };

        anchors.load_by_ids(Template::Plant(PlantKind::KelpBull), &[id]);
        assert!(anchors.poll().is_empty());
        anchors.load_by_ids(Template::Plant(PlantKind::BranchA), &[id, EntityId::new_v4()]);
        assert_eq!(anchors.poll().len(), 1);
    }

    #[test]
    fn clock_clones_share_time() {
        let clock = FixedClock::epoch();
        let handle = clock.clone();
        handle.advance(Duration::seconds(60));
        assert_eq!(clock.now() - FixedClock::epoch().now(), Duration::seconds(60));
    }
}

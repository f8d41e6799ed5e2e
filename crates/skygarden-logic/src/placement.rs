//! Spatial placement search - finds collision-free poses on room surfaces.
//!
//! Algorithm, per requested pose (poses are independent):
//! 1. Derive a planar footprint radius and vertical offsets from the object bounds
//! 2. Ask the room for a candidate (free-floating point, or surface point + normal)
//! 3. Reject if the offset center leaves the room, sits inside a scene volume,
//!    the surface is obstructed along its normal, or the rotated box overlaps
//!    geometry on the avoided layers
//! 4. Accept with "up" rotated onto the surface normal
//!
//! Slots that exhaust `max_attempts_per_pose` stay invalid. An invalid slot is
//! an explicit sentinel, never a zero vector.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::math::{Bounds, Quat, Vec3};

/// Lift applied to the overlap box so it does not intersect the surface it rests on.
const SURFACE_EPSILON: f32 = 0.01;

bitflags! {
    /// Surface orientation classes a candidate may be drawn from.
    pub struct SurfaceOrientation: u8 {
        const FACING_UP = 1 << 0;
        const FACING_DOWN = 1 << 1;
        const VERTICAL = 1 << 2;
    }
}

bitflags! {
    /// Semantic labels of room surfaces.
    pub struct SurfaceLabels: u32 {
        const FLOOR = 1 << 0;
        const CEILING = 1 << 1;
        const WALL_FACE = 1 << 2;
        const TABLE = 1 << 3;
        const COUCH = 1 << 4;
        const DOOR_FRAME = 1 << 5;
        const WINDOW_FRAME = 1 << 6;
        const STORAGE = 1 << 7;
        const BED = 1 << 8;
        const SCREEN = 1 << 9;
        const LAMP = 1 << 10;
        const PLANT = 1 << 11;
        const WALL_ART = 1 << 12;
        const OTHER = 1 << 13;
        const WALLS = Self::WALL_FACE.bits | Self::WINDOW_FRAME.bits | Self::WALL_ART.bits;
    }
}

impl Default for SurfaceLabels {
    fn default() -> Self {
        Self::all()
    }
}

/// Physics layers used by the box-overlap predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);
    pub const ISLANDS: Self = Self(1 << 8);
    pub const PLANTS: Self = Self(1 << 9);
    pub const SEEDS: Self = Self(1 << 10);

    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Where content may be attached in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnLocation {
    /// Free-floating inside the room, away from obstacles
    Floating,
    AnySurface,
    VerticalSurfaces,
    OnTopOfSurfaces,
    HangingDown,
}

impl SpawnLocation {
    /// Orientation mask for surface queries; `None` for floating placement.
    pub fn orientation(self) -> Option<SurfaceOrientation> {
        match self {
            SpawnLocation::Floating => None,
            SpawnLocation::AnySurface => Some(SurfaceOrientation::all()),
            SpawnLocation::VerticalSurfaces => Some(SurfaceOrientation::VERTICAL),
            SpawnLocation::OnTopOfSurfaces => Some(SurfaceOrientation::FACING_UP),
            SpawnLocation::HangingDown => Some(SurfaceOrientation::FACING_DOWN),
        }
    }
}

/// Room understanding consumed by the search.
///
/// Supplied by whatever scans the physical room. The random queries take
/// `&mut self` because implementations own their random source.
pub trait RoomQuery {
    /// Random free-floating point at least `min_radius` from walls and obstacles.
    fn random_point_in_room(&mut self, min_radius: f32) -> Option<Vec3>;

    /// Random point and outward unit normal on a matching surface.
    fn random_point_on_surface(
        &mut self,
        orientation: SurfaceOrientation,
        min_radius: f32,
        labels: SurfaceLabels,
    ) -> Option<(Vec3, Vec3)>;

    fn point_in_room(&self, point: Vec3) -> bool;

    fn point_in_occluded_volume(&self, point: Vec3) -> bool;

    /// Returns true when the ray hits something within `max_distance`.
    fn raycast_clearance(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool;

    /// Returns true when the oriented box intersects geometry on `layers`.
    fn box_overlap(&self, center: Vec3, extents: Vec3, orientation: Quat, layers: LayerMask)
        -> bool;
}

/// Search parameters for one `find_poses` call.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    /// Local bounds of the object to place; `None` skips footprint and overlap checks.
    pub object_bounds: Option<Bounds>,
    pub count: usize,
    pub location: SpawnLocation,
    pub labels: SurfaceLabels,
    pub check_overlaps: bool,
    /// Required free extent around the object, replacing the box footprint.
    pub override_extent: Option<f32>,
    pub avoid_layers: LayerMask,
    /// Free distance required in front of the surface.
    pub clearance_distance: f32,
    pub max_attempts_per_pose: u32,
}

impl Default for PlacementRequest {
    fn default() -> Self {
        Self {
            object_bounds: None,
            count: 8,
            location: SpawnLocation::Floating,
            labels: SurfaceLabels::all(),
            check_overlaps: true,
            override_extent: None,
            avoid_layers: LayerMask::ALL,
            clearance_distance: 0.1,
            max_attempts_per_pose: 1000,
        }
    }
}

impl PlacementRequest {
    pub fn new(object_bounds: Option<Bounds>, count: usize, location: SpawnLocation) -> Self {
        Self {
            object_bounds,
            count,
            location,
            ..Default::default()
        }
    }

    pub fn with_labels(mut self, labels: SurfaceLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn avoiding(mut self, layers: LayerMask) -> Self {
        self.avoid_layers = layers;
        self
    }

    pub fn with_clearance(mut self, distance: f32) -> Self {
        self.clearance_distance = distance;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts_per_pose = attempts;
        self
    }
}

/// One search result slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementCandidate {
    pub position: Vec3,
    pub orientation: Quat,
    pub valid: bool,
}

impl PlacementCandidate {
    /// The "no valid pose" sentinel.
    pub const INVALID: Self = Self {
        position: Vec3::NEG_INFINITY,
        orientation: Quat::IDENTITY,
        valid: false,
    };

    pub fn accepted(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            valid: true,
        }
    }

    /// `Some((position, orientation))` for an accepted slot.
    pub fn pose(&self) -> Option<(Vec3, Quat)> {
        if self.valid && self.position.is_finite() {
            Some((self.position, self.orientation))
        } else {
            None
        }
    }
}

/// Footprint and offsets derived once per request.
#[derive(Debug, Clone, Copy)]
struct Footprint {
    min_radius: f32,
    /// Distance along the normal from surface to object origin
    base_offset: f32,
    /// Distance along the normal from object origin to its center
    center_offset: f32,
    /// Box tested for overlaps, in object space
    overlap_box: Option<Bounds>,
}

impl Footprint {
    fn from_request(request: &PlacementRequest) -> Self {
        let Some(bounds) = request.object_bounds else {
            return Self {
                min_radius: 0.0,
                base_offset: 0.0,
                center_offset: 0.0,
                overlap_box: None,
            };
        };

        let min_radius = (-bounds.min.x)
            .min(-bounds.min.z)
            .min(bounds.max.x)
            .min(bounds.max.z)
            .max(0.0);

        let overlap_box = match request.override_extent {
            Some(extent) if extent > 0.0 => Bounds::from_center_extents(
                Vec3::new(0.0, SURFACE_EPSILON, 0.0),
                Vec3::new(extent, SURFACE_EPSILON, extent),
            ),
            _ => {
                let mut min = bounds.min;
                let mut max = bounds.max;
                min.y += SURFACE_EPSILON;
                if max.y < min.y {
                    max.y = min.y;
                }
                Bounds::new(min, max)
            }
        };

        Self {
            min_radius,
            base_offset: -bounds.min.y,
            center_offset: bounds.center().y,
            overlap_box: Some(overlap_box),
        }
    }
}

/// Find up to `request.count` valid poses. The result always has exactly
/// `request.count` slots; unplaceable slots hold [`PlacementCandidate::INVALID`].
pub fn find_poses(room: &mut dyn RoomQuery, request: &PlacementRequest) -> Vec<PlacementCandidate> {
    let footprint = Footprint::from_request(request);

    (0..request.count)
        .map(|slot| {
            let candidate = find_one(room, request, &footprint);
            if !candidate.valid {
                log::debug!(
                    "placement slot {} exhausted {} attempts ({:?})",
                    slot,
                    request.max_attempts_per_pose,
                    request.location
                );
            }
            candidate
        })
        .collect()
}

/// Number of accepted slots in a result batch.
pub fn valid_count(candidates: &[PlacementCandidate]) -> usize {
    candidates.iter().filter(|c| c.valid).count()
}

fn find_one(
    room: &mut dyn RoomQuery,
    request: &PlacementRequest,
    footprint: &Footprint,
) -> PlacementCandidate {
    for _ in 0..request.max_attempts_per_pose {
        let (position, rotation) = match request.location.orientation() {
            None => {
                // No free space left at all: further attempts cannot succeed
                let Some(point) = room.random_point_in_room(footprint.min_radius) else {
                    break;
                };
                let center = point + Vec3::UP * footprint.center_offset;
                if !room.point_in_room(center) || room.point_in_occluded_volume(center) {
                    continue;
                }
                (point, Quat::IDENTITY)
            }
            Some(orientation) => {
                let Some((surface_point, normal)) =
                    room.random_point_on_surface(orientation, footprint.min_radius, request.labels)
                else {
                    continue;
                };
                let position = surface_point + normal * footprint.base_offset;
                let center = position + normal * footprint.center_offset;

                // Surfaces can protrude through walls
                if !room.point_in_room(center) {
                    continue;
                }
                if room.point_in_occluded_volume(center) {
                    continue;
                }
                if room.raycast_clearance(surface_point, normal, request.clearance_distance) {
                    continue;
                }
                (position, Quat::from_rotation_arc(Vec3::UP, normal))
            }
        };

        if request.check_overlaps {
            if let Some(overlap_box) = footprint.overlap_box {
                let center = position + rotation * overlap_box.center();
                if room.box_overlap(center, overlap_box.extents(), rotation, request.avoid_layers) {
                    continue;
                }
            }
        }

        return PlacementCandidate::accepted(position, rotation);
    }

    PlacementCandidate::INVALID
}

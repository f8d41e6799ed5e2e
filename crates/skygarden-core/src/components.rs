//! ECS components and identities for garden entities.
//!
//! Plants and islands live in the `hecs` world as an [`Anchor`] plus a
//! [`Transform`] and a kind component. Seeds are pooled and never enter the
//! world.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skygarden_logic::kinds::{IslandKind, PlantKind};
use skygarden_logic::math::{Color, Quat, Vec3};
use skygarden_logic::mergeable::Mergeable;
use skygarden_logic::pool::Poolable;

// ── Identity ───────────────────────────────────────────────────────────────

/// Stable identity of a durable entity, assigned by the anchor service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of one seed throw. A pooled seed gets a fresh id each time it is
/// borrowed, so stale plantings never match a reused instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeedId(pub u64);

impl std::fmt::Display for SeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seed#{}", self.0)
    }
}

// ── World components ───────────────────────────────────────────────────────

/// Durable anchor backing a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Transform {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Local point to world space.
    pub fn apply(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }
}

/// Plant tag. Its growth lives in a `GrowthSimulator` component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plant {
    pub kind: PlantKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Island {
    pub kind: IslandKind,
}

// ── Seeds ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedState {
    /// Resting in the room, waiting to be thrown
    Idle,
    /// Thrown and steering toward its resolved ceiling pose
    Flying { target: Vec3 },
}

/// A pooled seed instance.
#[derive(Debug)]
pub struct Seed {
    slot: usize,
    pub id: SeedId,
    pub position: Vec3,
    pub state: SeedState,
    base_scale: f32,
    scale: f32,
    color: Color,
    locked: bool,
}

impl Seed {
    pub fn new(slot: usize, base_scale: f32) -> Self {
        Self {
            slot,
            id: SeedId(0),
            position: Vec3::NEG_INFINITY,
            state: SeedState::Idle,
            base_scale,
            scale: base_scale,
            color: Color::WHITE,
            locked: false,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.state, SeedState::Flying { .. })
    }
}

impl Poolable for Seed {
    type Key = usize;

    fn pool_key(&self) -> usize {
        self.slot
    }

    fn reset(&mut self) {
        self.id = SeedId(0);
        self.position = Vec3::NEG_INFINITY;
        self.state = SeedState::Idle;
        self.scale = self.base_scale;
        self.color = Color::WHITE;
        self.locked = false;
    }
}

impl Mergeable for Seed {
    fn size(&self) -> f32 {
        self.scale
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn color(&self) -> Color {
        self.color
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn lock_for_absorption(&mut self) {
        self.locked = true;
    }
}

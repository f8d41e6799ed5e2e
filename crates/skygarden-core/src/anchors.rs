//! Durable anchor collaborator seam.
//!
//! Requests are fire-and-forget; results come back from [`AnchorService::poll`],
//! which the engine calls once per tick. Completions for the same request type
//! arrive in request order.

use skygarden_logic::kinds::{IslandKind, PlantKind};
use skygarden_logic::math::{Quat, Vec3};

use crate::components::EntityId;

/// What an anchor instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Plant(PlantKind),
    Island(IslandKind),
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Template::Plant(kind) => write!(f, "plant {:?}", kind),
            Template::Island(kind) => write!(f, "island {:?}", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorEvent {
    /// A creation request finished. `id` is `None` when it failed.
    Created {
        template: Template,
        id: Option<EntityId>,
        position: Vec3,
        orientation: Quat,
    },
    /// A previously created anchor was found again.
    Loaded {
        template: Template,
        id: EntityId,
        position: Vec3,
        orientation: Quat,
    },
    Erased {
        id: EntityId,
        success: bool,
    },
    ErasedAll {
        success: bool,
    },
}

pub trait AnchorService {
    fn create(&mut self, template: Template, position: Vec3, orientation: Quat);

    /// Re-instantiate previously created anchors of one template.
    fn load_by_ids(&mut self, template: Template, ids: &[EntityId]);

    fn erase(&mut self, id: EntityId);

    fn erase_all(&mut self);

    /// Completions since the last poll.
    fn poll(&mut self) -> Vec<AnchorEvent>;
}

/// Outstanding creation requests per template family.
///
/// Completions of one family arrive in request order, so counting is enough
/// to tell which completions belong to requests made before an erase-all.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CreateTracker {
    islands: Outstanding,
    plants: Outstanding,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    pending: usize,
    stale: usize,
}

impl CreateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn family(&mut self, template: Template) -> &mut Outstanding {
        match template {
            Template::Island(_) => &mut self.islands,
            Template::Plant(_) => &mut self.plants,
        }
    }

    pub fn requested(&mut self, template: Template) {
        self.family(template).pending += 1;
    }

    /// Record a completion. Returns `true` when it answers a request made
    /// before the last [`CreateTracker::invalidate`].
    pub fn completed(&mut self, template: Template) -> bool {
        let family = self.family(template);
        family.pending = family.pending.saturating_sub(1);
        if family.stale > 0 {
            family.stale -= 1;
            true
        } else {
            false
        }
    }

    /// Every request still outstanding becomes stale.
    pub fn invalidate(&mut self) {
        for family in [&mut self.islands, &mut self.plants] {
            family.stale = family.pending;
        }
    }

    pub fn pending(&self) -> usize {
        self.islands.pending + self.plants.pending
    }

    pub fn stale(&self) -> usize {
        self.islands.stale + self.plants.stale
    }
}

//! Fire-and-forget notifications for animation, audio and UI listeners.
//!
//! Listeners either hear everything, or are scoped to one entity and hear
//! only that entity's notifications. Scoped listeners are dropped when the
//! entity is torn down via [`NotificationHub::release_owner`]. Every
//! notification is also kept in an outbox for hosts that poll.

use skygarden_logic::math::Vec3;

use crate::components::{EntityId, SeedId};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PlantReadyToHarvest { plant: EntityId },
    PlantChargingUp { plant: EntityId },
    PlantChargingDown { plant: EntityId },
    PlantGlowingBeforeSeedSpawn { plant: EntityId },
    SeedSpawnedFromPlant { plant: EntityId, seeds: usize },
    /// Dull delay after a long absence is over
    PlantAwake { plant: EntityId },
    PlantRegrowing { plant: EntityId },
    IslandEmerged { island: EntityId, position: Vec3 },
    SeedPoppedOnCeiling { seed: SeedId, position: Vec3 },
    SeedPoppedOnIsland { seed: SeedId, position: Vec3 },
    SeedCombined { absorber: SeedId, absorbed: SeedId, scale: f32 },
}

impl Notification {
    /// The durable entity this notification is about, if any.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Notification::PlantReadyToHarvest { plant }
            | Notification::PlantChargingUp { plant }
            | Notification::PlantChargingDown { plant }
            | Notification::PlantGlowingBeforeSeedSpawn { plant }
            | Notification::SeedSpawnedFromPlant { plant, .. }
            | Notification::PlantAwake { plant }
            | Notification::PlantRegrowing { plant } => Some(*plant),
            Notification::IslandEmerged { island, .. } => Some(*island),
            Notification::SeedPoppedOnCeiling { .. }
            | Notification::SeedPoppedOnIsland { .. }
            | Notification::SeedCombined { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&Notification)>;

struct Subscription {
    id: SubscriptionId,
    owner: Option<EntityId>,
    listener: Listener,
}

#[derive(Default)]
pub struct NotificationHub {
    next_id: u64,
    subscriptions: Vec<Subscription>,
    outbox: Vec<Notification>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to every notification until unsubscribed.
    pub fn subscribe(&mut self, listener: impl FnMut(&Notification) + 'static) -> SubscriptionId {
        self.add(None, Box::new(listener))
    }

    /// Listen to `owner`'s notifications until `owner` is released.
    pub fn subscribe_scoped(
        &mut self,
        owner: EntityId,
        listener: impl FnMut(&Notification) + 'static,
    ) -> SubscriptionId {
        self.add(Some(owner), Box::new(listener))
    }

    /// Returns false if `id` was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Drop every subscription scoped to `owner`.
    pub fn release_owner(&mut self, owner: EntityId) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.owner != Some(owner));
        before - self.subscriptions.len()
    }

    pub fn emit(&mut self, notification: Notification) {
        let subject = notification.entity();
        for sub in self.subscriptions.iter_mut() {
            if sub.owner.is_none() || sub.owner == subject {
                (sub.listener)(&notification);
            }
        }
        self.outbox.push(notification);
    }

    /// Take everything emitted since the last drain.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn add(&mut self, owner: Option<EntityId>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            owner,
            listener,
        });
        id
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscriptions", &self.subscriptions.len())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

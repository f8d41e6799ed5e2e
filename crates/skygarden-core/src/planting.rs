//! In-flight plantings: seeds that have a target pose but no plant yet.
//!
//! A planting sits in exactly one place: the in-flight map while its seed is
//! flying, or the pending-island queue once the seed has asked for an island.

use std::collections::{HashMap, VecDeque};

use skygarden_logic::kinds::PlantKind;
use skygarden_logic::math::{Quat, Vec3};

use crate::components::SeedId;
use crate::error::GardenError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planting {
    pub seed: SeedId,
    pub kind: PlantKind,
    pub position: Vec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct PlantingBook {
    in_flight: HashMap<SeedId, Planting>,
    pending_islands: VecDeque<Planting>,
}

impl PlantingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a planting for a flying seed.
    pub fn insert(&mut self, planting: Planting) -> Result<(), GardenError> {
        if self.contains(planting.seed) {
            return Err(GardenError::SeedBusy(planting.seed));
        }
        self.in_flight.insert(planting.seed, planting);
        Ok(())
    }

    /// Remove and return a flying seed's planting.
    pub fn take(&mut self, seed: SeedId) -> Option<Planting> {
        self.in_flight.remove(&seed)
    }

    /// Move a flying seed's planting to the back of the pending-island queue.
    pub fn promote(&mut self, seed: SeedId) -> Option<Planting> {
        let planting = self.in_flight.remove(&seed)?;
        self.pending_islands.push_back(planting);
        Some(planting)
    }

    /// Oldest planting waiting on an island.
    pub fn pop_pending(&mut self) -> Option<Planting> {
        self.pending_islands.pop_front()
    }

    pub fn contains(&self, seed: SeedId) -> bool {
        self.in_flight.contains_key(&seed) || self.is_pending(seed)
    }

    pub fn is_in_flight(&self, seed: SeedId) -> bool {
        self.in_flight.contains_key(&seed)
    }

    pub fn is_pending(&self, seed: SeedId) -> bool {
        self.pending_islands.iter().any(|p| p.seed == seed)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Planting> {
        self.pending_islands.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending_islands.len()
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
        self.pending_islands.clear();
    }
}

//! Errors returned to the host by engine operations.

use thiserror::Error;

use crate::components::{EntityId, SeedId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GardenError {
    #[error("no valid ceiling placement found for {0}")]
    PlacementFailed(SeedId),
    #[error("unknown {0}")]
    UnknownSeed(SeedId),
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("no template registered for {0}")]
    MissingTemplate(String),
    #[error("{0} already has a planting in flight")]
    SeedBusy(SeedId),
    #[error("plant {0} is not fully grown")]
    NotFullyGrown(EntityId),
    #[error("no idle seeds to throw")]
    NoIdleSeeds,
}

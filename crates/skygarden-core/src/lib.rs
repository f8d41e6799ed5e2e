//! SkyGarden Core - Persistent Mixed-Reality Garden Engine
//!
//! Seeds are thrown at the ceiling, grow islands there, and the islands
//! sprout plants that grow in real time, charge when touched, and burst
//! into new seeds. Everything survives restarts through spatial anchors
//! plus a JSON save file.
//!
//! # Architecture
//!
//! Live plants and islands are `hecs` entities:
//! - **Components**: `Anchor`, `Transform`, `Plant` / `Island`, `GrowthSimulator`
//! - **Systems**: growth ticking and save snapshots
//! - **Services**: the anchor backend and room query are traits supplied by the host
//!
//! Seeds are pooled outside the world since they are reused constantly.
//!
//! # Example
//!
//! ```rust,no_run
//! use skygarden_core::prelude::*;
//! use skygarden_core::testing::{BoxRoom, MemoryAnchors};
//!
//! let store = GardenStore::open("GardenData.json");
//! let mut engine = GardenEngine::new(
//!     GardenConfig::default(),
//!     store,
//!     MemoryAnchors::new(),
//!     BoxRoom::standard(7),
//! );
//! engine.init_garden();
//! engine.spawn_seeds_on_walls();
//!
//! loop {
//!     engine.update(1.0 / 60.0);
//! }
//! ```

pub mod anchors;
pub mod catalog;
pub mod clock;
pub mod components;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod persistence;
pub mod planting;
pub mod systems;
pub mod testing;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::anchors::{AnchorEvent, AnchorService, Template};
    pub use crate::components::*;
    pub use crate::engine::GardenEngine;
    pub use crate::error::GardenError;
    pub use crate::notify::Notification;
    pub use crate::persistence::GardenStore;
    pub use skygarden_logic::config::{GameMode, GardenConfig};
    pub use skygarden_logic::kinds::{IslandKind, PlantKind};
    pub use skygarden_logic::math::Vec3;
}

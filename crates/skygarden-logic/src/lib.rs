//! Pure garden logic for SkyGarden.
//!
//! Everything here is independent of storage, anchors, and engine state.
//! Functions take plain data (and a [`placement::RoomQuery`] where the room
//! must be consulted) and return results, so each piece is unit-testable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Growth, mode, placement, and harvest tuning (JSON-loadable) |
//! | [`growth`] | Per-plant growth / charge / cooldown state machine |
//! | [`kinds`] | Plant and island kinds, seed-to-kind policy |
//! | [`math`] | `Vec3`, `Quat`, `Bounds`, `Color` |
//! | [`mergeable`] | Size-based absorption shared by all mergeable entities |
//! | [`placement`] | Collision-free pose search on labeled room surfaces |
//! | [`pool`] | Reusable instance pool |

pub mod config;
pub mod growth;
pub mod kinds;
pub mod math;
pub mod mergeable;
pub mod placement;
pub mod pool;

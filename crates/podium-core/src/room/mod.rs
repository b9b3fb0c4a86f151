//! Room module.
//!
//! # Module Structure
//!
//! - `model`: `Room`, its transcript history entries and `RoomSnapshot`
//! - `registry`: `RoomRegistry`, the lazily-populated per-room state container

mod model;
mod registry;

pub use model::{Room, RoomSnapshot, TranscriptEntry};
pub use registry::RoomRegistry;

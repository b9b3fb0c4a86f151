//! Application layer for podium.
//!
//! Wires the core engine into use cases: a live audience per process,
//! bot spawning from persona pools, and the observer transport bridge.

pub mod bot_spawner;
pub mod live_audience;
pub mod observer_hub;

pub use bot_spawner::BotSpawner;
pub use live_audience::LiveAudience;
pub use observer_hub::{Observer, ObserverHub};

//! Domain core of the live audience engine.
//!
//! Synchronous building blocks only: buffering, dispatch, room state, the
//! stage 1 heuristic and the gate. The asynchronous per-bot scheduling lives
//! in `podium-execution`.

pub mod bot;
pub mod coach;
pub mod config;
pub mod error;
pub mod event;
pub mod persona;
pub mod reaction;
pub mod room;
pub mod transcript;

// Re-export common error type
pub use error::{PodiumError, Result};

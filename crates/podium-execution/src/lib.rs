//! Reaction scheduling and runtime plumbing for podium.
//!
//! # Module Structure
//!
//! - `scheduler`: `ReactionScheduler`, the per-bot fan-out of stage 1, stage 2 and gating
//! - `telemetry`: Subscriber setup and the `LogForwardLayer`

pub mod scheduler;
pub mod telemetry;

pub use scheduler::{DISENGAGED_REASON, ReactionScheduler};
pub use telemetry::{LogForwardLayer, LogFormat, LogRecord, init_tracing};

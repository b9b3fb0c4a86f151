//! Bot domain module.
//!
//! # Module Structure
//!
//! - `model`: `Bot` (identity + persona + locked state) and `BotSnapshot`
//! - `state`: `BotState`, the mutable engagement/gating/anti-repetition fields

mod model;
mod state;

pub use model::{Bot, BotSnapshot};
pub use state::{BotState, EngagementSample, RECENT_EMOJI_CAPACITY};

//! Event module.
//!
//! # Module Structure
//!
//! - `model`: Outbound `Event` envelope, payloads, `EventKind` topics and inbound `ClientMessage`
//! - `dispatcher`: `EventDispatcher` bus and the `EventHandler` trait

mod dispatcher;
mod model;

pub use dispatcher::{EventDispatcher, EventHandler, PublishReport};
pub use model::{
    ClientMessage, CoachFeedbackPayload, Event, EventKind, JoinPayload, LeavePayload, ReactionPayload,
    ReadyPayload,
};

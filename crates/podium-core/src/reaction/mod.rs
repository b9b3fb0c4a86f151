//! Reaction domain module.
//!
//! # Module Structure
//!
//! - `model`: `Reaction` and the heuristic `Bucket`
//! - `generator`: External generation contract (`ReactionGenerator`, `GenerationError`)
//! - `table`: Configurable (bucket, stance, domain) lookup
//! - `policy`: Stage 1 heuristic scorer
//! - `gate`: Cooldown and probability gate
//! - `decision`: Per-unit-of-work decision record

mod decision;
mod gate;
mod generator;
mod model;
mod policy;
mod table;

pub use decision::{DecisionPath, DecisionRecord, EscalationDecision};
pub use gate::{GateKeeper, GateOutcome};
pub use generator::{GenerationError, ReactionGenerator, parse_generated_reaction};
pub use model::{Bucket, MAX_PHRASE_WORDS, Reaction, SCORE_DELTA_MAX, SCORE_DELTA_MIN, THINKING_EMOJI};
pub use policy::{HeuristicReaction, ReactionPolicyEngine};
pub use table::{ReactionRule, ReactionTable};

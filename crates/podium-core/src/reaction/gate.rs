//! Cooldown and probability gate.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bot::BotState;
use crate::persona::Stance;
use crate::transcript::FlushMetadata;

/// Why a reaction was or was not let through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Admitted,
    #[serde(rename_all = "camelCase")]
    Cooldown { remaining_ms: u64 },
    #[serde(rename_all = "camelCase")]
    ProbabilityRejected { probability: f64 },
}

impl GateOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Decides whether a bot may emit right now, using only that bot's state.
#[derive(Debug, Clone, Copy)]
pub struct GateKeeper {
    stutter_boost: f64,
}

impl GateKeeper {
    pub fn new(stutter_boost: f64) -> Self {
        Self { stutter_boost }
    }

    /// Probability of passing the random check for this chunk.
    pub fn effective_probability(&self, state: &BotState, stance: Stance, metadata: &FlushMetadata) -> f64 {
        let boost = if metadata.has_stutter() && stance == Stance::Supportive {
            self.stutter_boost
        } else {
            0.0
        };
        (state.reaction_probability + boost).min(1.0)
    }

    /// Evaluates the gate with a caller-supplied roll in `[0, 1)`.
    ///
    /// On admission `last_reaction_at` is set to `now` before returning, so the
    /// caller holding the bot's lock makes decision and update one step.
    pub fn evaluate(
        &self,
        state: &mut BotState,
        stance: Stance,
        metadata: &FlushMetadata,
        now: Instant,
        roll: f64,
    ) -> GateOutcome {
        if let Some(last) = state.last_reaction_at {
            let elapsed = now.saturating_duration_since(last);
            let cooldown = state.cooldown();
            if elapsed < cooldown {
                return GateOutcome::Cooldown {
                    remaining_ms: (cooldown - elapsed).as_millis() as u64,
                };
            }
        }

        let probability = self.effective_probability(state, stance, metadata);
        if roll >= probability {
            return GateOutcome::ProbabilityRejected { probability };
        }

        state.last_reaction_at = Some(now);
        GateOutcome::Admitted
    }

    /// [`GateKeeper::evaluate`] with a fresh random roll.
    pub fn should_emit(
        &self,
        state: &mut BotState,
        stance: Stance,
        metadata: &FlushMetadata,
        now: Instant,
    ) -> GateOutcome {
        let roll = rand::thread_rng().gen_range(0.0..1.0);
        self.evaluate(state, stance, metadata, now, roll)
    }
}

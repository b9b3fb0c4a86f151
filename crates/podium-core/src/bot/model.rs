use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use super::state::BotState;
use crate::config::BotDefaults;
use crate::persona::Persona;

/// A simulated audience member.
///
/// Identity and persona never change after construction. The mutable state is
/// behind a per-bot lock so that concurrent reaction tasks for the same bot
/// see every update made by the others.
#[derive(Debug)]
pub struct Bot {
    id: String,
    persona: Persona,
    state: Mutex<BotState>,
}

impl Bot {
    /// Creates a bot with a fresh UUID.
    pub fn new(persona: Persona, defaults: &BotDefaults) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), persona, BotState::from_defaults(defaults))
    }

    pub fn with_id(id: impl Into<String>, persona: Persona, state: BotState) -> Self {
        Self {
            id: id.into(),
            persona,
            state: Mutex::new(state),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn is_present(&self) -> bool {
        self.with_state(|state| state.present)
    }

    /// Runs `f` with exclusive access to the bot's state.
    ///
    /// Everything inside `f` is atomic with respect to other tasks working on
    /// the same bot. `f` must not block.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut BotState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn snapshot(&self) -> BotSnapshot {
        self.with_state(|state| BotSnapshot {
            id: self.id.clone(),
            persona: self.persona.clone(),
            engagement_score: state.engagement_score,
            present: state.present,
            recent_emojis: state.recent_emojis().map(str::to_string).collect(),
            cooldown_secs: state.cooldown_secs,
            reaction_probability: state.reaction_probability,
        })
    }
}

/// Read-only copy of a bot for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSnapshot {
    pub id: String,
    pub persona: Persona,
    pub engagement_score: f64,
    pub present: bool,
    pub recent_emojis: Vec<String>,
    pub cooldown_secs: f64,
    pub reaction_probability: f64,
}

//! Engine configuration.
//!
//! Every section deserializes with defaults, so a partial `config.toml` only
//! needs to name the values it overrides:
//!
//! ```toml
//! [buffer]
//! flush_interval_secs = 1.5
//! flush_policy = "interval_only"
//!
//! [scheduler]
//! suppression_probability = 0.2
//! escalation_stances = ["skeptical"]
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PodiumError, Result};
use crate::persona::Stance;
use crate::reaction::ReactionRule;

/// Root configuration for the live reaction engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub buffer: BufferConfig,
    pub scheduler: SchedulerConfig,
    pub bot: BotDefaults,
    pub room: RoomConfig,
    /// Extra reaction-table rules; they take precedence over the built-in table.
    pub reactions: Vec<ReactionRule>,
}

impl EngineConfig {
    /// Parses a TOML document into a configuration and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks ranges that the engine relies on at runtime.
    pub fn validate(&self) -> Result<()> {
        let buffer = &self.buffer;
        if !(buffer.flush_interval_secs.is_finite() && buffer.flush_interval_secs > 0.0) {
            return Err(PodiumError::config(
                "buffer.flush_interval_secs must be a positive number",
            ));
        }

        let scheduler = &self.scheduler;
        ensure_probability("scheduler.suppression_probability", scheduler.suppression_probability)?;
        ensure_probability("scheduler.escalation_bias", scheduler.escalation_bias)?;
        ensure_probability(
            "scheduler.base_escalation_probability",
            scheduler.base_escalation_probability,
        )?;
        ensure_probability("scheduler.stutter_boost", scheduler.stutter_boost)?;
        if scheduler.generation_timeout_ms == 0 {
            return Err(PodiumError::config(
                "scheduler.generation_timeout_ms must be greater than zero",
            ));
        }
        if !scheduler.departure_threshold.is_finite() {
            return Err(PodiumError::config(
                "scheduler.departure_threshold must be a finite number",
            ));
        }

        let bot = &self.bot;
        ensure_probability("bot.reaction_probability", bot.reaction_probability)?;
        if !(bot.cooldown_secs.is_finite() && bot.cooldown_secs >= 0.0) {
            return Err(PodiumError::config("bot.cooldown_secs must not be negative"));
        }
        if !bot.engagement_score.is_finite() {
            return Err(PodiumError::config("bot.engagement_score must be a finite number"));
        }

        if self.room.history_capacity == 0 {
            return Err(PodiumError::config("room.history_capacity must be at least 1"));
        }

        for rule in &self.reactions {
            rule.validate()?;
        }

        Ok(())
    }
}

fn ensure_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PodiumError::config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

/// Which conditions flush a transcript buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Flush on a sentence terminator, or once the interval has elapsed.
    #[default]
    TerminatorOrInterval,
    /// Flush only once the interval has elapsed, ignoring terminators.
    IntervalOnly,
}

/// Transcript buffering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub flush_interval_secs: f64,
    pub flush_policy: FlushPolicy,
}

impl BufferConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs_f64(self.flush_interval_secs.max(0.0))
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 2.0,
            flush_policy: FlushPolicy::default(),
        }
    }
}

/// Per-bot reaction pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Chance that a bot stays silent for a chunk before anything else happens.
    pub suppression_probability: f64,
    /// Stances allowed to escalate question chunks to the generator.
    pub escalation_stances: Vec<Stance>,
    /// Escalation chance for an eligible (question + stance) bot.
    pub escalation_bias: f64,
    /// Escalation chance for any bot, eligible or not.
    pub base_escalation_probability: f64,
    /// Budget for a single generator call.
    pub generation_timeout_ms: u64,
    /// Upper bound of the random stagger applied before gating.
    pub max_jitter_ms: u64,
    /// Added to the reaction probability of supportive bots on stuttered chunks.
    pub stutter_boost: f64,
    /// Engagement score below which a bot leaves the room.
    pub departure_threshold: f64,
    /// Feed emitted score deltas back into engagement and check departure.
    pub track_engagement: bool,
    /// Publish a `reaction_debug` event with the decision record of every unit of work.
    pub debug_events: bool,
}

impl SchedulerConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    pub fn is_escalation_stance(&self, stance: Stance) -> bool {
        self.escalation_stances.contains(&stance)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            suppression_probability: 0.30,
            escalation_stances: vec![Stance::Skeptical, Stance::Curious],
            escalation_bias: 0.5,
            base_escalation_probability: 0.05,
            generation_timeout_ms: 2500,
            max_jitter_ms: 600,
            stutter_boost: 0.25,
            departure_threshold: -30.0,
            track_engagement: true,
            debug_events: false,
        }
    }
}

/// Initial mutable state handed to every newly spawned bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotDefaults {
    pub engagement_score: f64,
    pub cooldown_secs: f64,
    pub reaction_probability: f64,
}

impl Default for BotDefaults {
    fn default() -> Self {
        Self {
            engagement_score: 10.0,
            cooldown_secs: 3.0,
            reaction_probability: 0.6,
        }
    }
}

/// Room retention settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Maximum number of transcript entries kept per room.
    pub history_capacity: usize,
    /// Transcript window included in room snapshots.
    pub snapshot_window_secs: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            snapshot_window_secs: 60,
        }
    }
}

/// Contents of `secret.json`.
///
/// ```json
/// { "openai": { "api_key": "sk-...", "model_name": "gpt-4o-mini" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiConfig>,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .finish()
    }
}

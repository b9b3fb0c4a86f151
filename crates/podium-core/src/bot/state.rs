use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::BotDefaults;

/// Anti-repetition memory size.
pub const RECENT_EMOJI_CAPACITY: usize = 5;

/// One point on a bot's engagement curve.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementSample {
    pub at: DateTime<Utc>,
    pub score: f64,
}

/// Mutable per-bot state.
///
/// Every field the reaction pipeline touches is declared here; nothing is
/// attached later. Access goes through the owning [`super::Bot`]'s lock.
#[derive(Debug, Clone)]
pub struct BotState {
    pub engagement_score: f64,
    pub present: bool,
    /// Free-form notes about the session. Not read by the reaction pipeline.
    pub memory: Vec<String>,
    pub engagement_history: Vec<EngagementSample>,
    recent_emojis: VecDeque<String>,
    /// Monotonic time of the last emitted reaction.
    pub last_reaction_at: Option<Instant>,
    pub cooldown_secs: f64,
    pub reaction_probability: f64,
}

impl Default for BotState {
    fn default() -> Self {
        Self::from_defaults(&BotDefaults::default())
    }
}

impl BotState {
    pub fn from_defaults(defaults: &BotDefaults) -> Self {
        Self {
            engagement_score: defaults.engagement_score,
            present: true,
            memory: Vec::new(),
            engagement_history: Vec::new(),
            recent_emojis: VecDeque::with_capacity(RECENT_EMOJI_CAPACITY),
            last_reaction_at: None,
            cooldown_secs: defaults.cooldown_secs,
            reaction_probability: defaults.reaction_probability,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs.max(0.0))
    }

    /// Most recently remembered emoji.
    pub fn last_emoji(&self) -> Option<&str> {
        self.recent_emojis.back().map(String::as_str)
    }

    /// Second most recently remembered emoji.
    pub fn previous_emoji(&self) -> Option<&str> {
        let len = self.recent_emojis.len();
        if len < 2 {
            return None;
        }
        self.recent_emojis.get(len - 2).map(String::as_str)
    }

    /// Pushes an emoji, dropping the oldest once the buffer is full.
    pub fn remember_emoji(&mut self, emoji: impl Into<String>) {
        while self.recent_emojis.len() >= RECENT_EMOJI_CAPACITY {
            self.recent_emojis.pop_front();
        }
        self.recent_emojis.push_back(emoji.into());
    }

    /// Oldest first.
    pub fn recent_emojis(&self) -> impl Iterator<Item = &str> {
        self.recent_emojis.iter().map(String::as_str)
    }

    pub fn recent_emoji_count(&self) -> usize {
        self.recent_emojis.len()
    }

    /// Adds an emitted score delta and records the new score.
    ///
    /// Returns `true` exactly once: on the call that moves a present bot
    /// below `departure_threshold`.
    pub fn apply_score_delta(&mut self, delta: i32, at: DateTime<Utc>, departure_threshold: f64) -> bool {
        self.engagement_score += f64::from(delta);
        self.engagement_history.push(EngagementSample {
            at,
            score: self.engagement_score,
        });

        if self.present && self.engagement_score < departure_threshold {
            self.present = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = BotState::default();
        assert_eq!(state.engagement_score, 10.0);
        assert!(state.present);
        assert_eq!(state.cooldown_secs, 3.0);
        assert_eq!(state.reaction_probability, 0.6);
        assert!(state.last_reaction_at.is_none());
        assert_eq!(state.recent_emoji_count(), 0);
    }

    #[test]
    fn test_recent_emojis_are_bounded() {
        let mut state = BotState::default();
        for i in 0..12 {
            state.remember_emoji(format!("U+{i}"));
            assert!(state.recent_emoji_count() <= RECENT_EMOJI_CAPACITY);
        }
        let kept: Vec<&str> = state.recent_emojis().collect();
        assert_eq!(kept, vec!["U+7", "U+8", "U+9", "U+10", "U+11"]);
        assert_eq!(state.last_emoji(), Some("U+11"));
        assert_eq!(state.previous_emoji(), Some("U+10"));
    }

    #[test]
    fn test_departure_fires_once() {
        let mut state = BotState::default();
        let now = Utc::now();
        assert!(!state.apply_score_delta(-5, now, 0.0));
        assert!(!state.apply_score_delta(-5, now, 0.0));
        assert!(state.apply_score_delta(-1, now, 0.0));
        assert!(!state.present);
        assert!(!state.apply_score_delta(-5, now, 0.0));
        assert_eq!(state.engagement_history.len(), 4);
        assert_eq!(state.engagement_history[2].score, -1.0);
    }
}

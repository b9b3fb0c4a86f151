use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest score delta a reaction may carry.
pub const SCORE_DELTA_MIN: i32 = -5;
/// Largest score delta a reaction may carry.
pub const SCORE_DELTA_MAX: i32 = 5;
/// Reaction phrases are at most this many words.
pub const MAX_PHRASE_WORDS: usize = 3;
/// Hourglass shown while a bot is still waiting on the generator.
pub const THINKING_EMOJI: &str = "U+23F3";

/// A single visible audience reaction.
///
/// Reactions are ephemeral: they are published once and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Emoji code point, e.g. `U+1F44F`
    pub emoji: String,
    /// Short phrase, at most three words
    pub phrase: String,
    /// Engagement change in `[-5, 5]`
    pub score_delta: i32,
}

impl Reaction {
    /// Builds a reaction, truncating the phrase and clamping the delta.
    pub fn new(emoji: impl Into<String>, phrase: &str, score_delta: i32) -> Self {
        Self {
            emoji: emoji.into(),
            phrase: truncate_words(phrase, MAX_PHRASE_WORDS),
            score_delta: score_delta.clamp(SCORE_DELTA_MIN, SCORE_DELTA_MAX),
        }
    }

    /// Placeholder emitted when the generator does not answer in time.
    pub fn thinking() -> Self {
        Self::new(THINKING_EMOJI, "Thinking...", 0)
    }

    pub fn is_thinking(&self) -> bool {
        self.emoji == THINKING_EMOJI && self.score_delta == 0
    }
}

pub(crate) fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Coarse sentiment class produced by the heuristic scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Negative,
    Neutral,
    Positive,
    Curious,
    Anticipation,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Negative,
        Bucket::Neutral,
        Bucket::Positive,
        Bucket::Curious,
        Bucket::Anticipation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Negative => "negative",
            Bucket::Neutral => "neutral",
            Bucket::Positive => "positive",
            Bucket::Curious => "curious",
            Bucket::Anticipation => "anticipation",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

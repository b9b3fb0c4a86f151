//! External reaction generation contract.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::model::{Reaction, SCORE_DELTA_MAX, SCORE_DELTA_MIN};
use crate::persona::Persona;

/// Failure reported by an external generator.
///
/// Timeouts are not represented here: the caller enforces its own budget and
/// treats an expired budget separately from a failed call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The generator could not be reached or answered with an HTTP-level failure
    #[error("Transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
        retryable: bool,
    },

    /// The generator answered, but the content is not a usable reaction
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The generator is not configured (e.g. missing credentials)
    #[error("Generator unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Creates a Transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport {
            status,
            message: message.into(),
            retryable,
        }
    }

    /// Creates a Malformed error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { retryable: true, .. })
    }

    /// Whether the output itself was unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Slow path ("stage 2"): asks an external model how a persona reacts to text.
///
/// Latency is unbounded from the implementor's side; callers wrap the call
/// in their own timeout.
#[async_trait]
pub trait ReactionGenerator: Send + Sync {
    async fn generate(&self, persona: &Persona, text: &str) -> Result<Reaction, GenerationError>;
}

/// Parses generator output of the form
/// `{"emoji_unicode": "U+1F610", "micro_phrase": "Interesting point", "score_delta": 1}`.
///
/// Markdown code fences around the JSON are tolerated. Phrases longer than
/// three words are truncated; a missing emoji, a missing phrase or a score
/// delta outside `[-5, 5]` make the response malformed.
pub fn parse_generated_reaction(content: &str) -> Result<Reaction, GenerationError> {
    let body = strip_code_fence(content);
    let value: Value = serde_json::from_str(body)
        .map_err(|err| GenerationError::malformed(format!("invalid JSON: {err}")))?;

    let emoji = value
        .get("emoji_unicode")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GenerationError::malformed("missing emoji_unicode"))?;

    let phrase = value
        .get("micro_phrase")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GenerationError::malformed("missing micro_phrase"))?;

    let delta = value
        .get("score_delta")
        .and_then(Value::as_f64)
        .ok_or_else(|| GenerationError::malformed("missing numeric score_delta"))?
        .round();

    if delta < f64::from(SCORE_DELTA_MIN) || delta > f64::from(SCORE_DELTA_MAX) {
        return Err(GenerationError::malformed(format!(
            "score_delta {delta} outside [{SCORE_DELTA_MIN}, {SCORE_DELTA_MAX}]"
        )));
    }

    Ok(Reaction::new(emoji, phrase, delta as i32))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

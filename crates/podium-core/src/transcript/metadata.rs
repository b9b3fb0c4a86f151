use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Tokens up to this many characters count as stutter when repeated.
const STUTTER_TOKEN_MAX_CHARS: usize = 4;

/// Three or more dots (optionally spaced) or a unicode ellipsis.
static PAUSE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?:\.\s*){3,}|\u{2026}").ok());

/// Linguistic signals computed when a buffer flushes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushMetadata {
    pub is_question: bool,
    pub is_exclamation: bool,
    pub stutter_count: u32,
    pub has_rhetorical_pause: bool,
}

impl FlushMetadata {
    pub fn analyze(text: &str) -> Self {
        Self {
            is_question: text.contains('?'),
            is_exclamation: text.contains('!'),
            stutter_count: count_stutters(text),
            has_rhetorical_pause: PAUSE_PATTERN
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(text)),
        }
    }

    pub fn has_stutter(&self) -> bool {
        self.stutter_count > 0
    }
}

/// Counts immediately repeated short tokens: "I I think" and "w-w-we" both
/// count; "really really" does not (too long to be a stutter).
fn count_stutters(text: &str) -> u32 {
    let tokens: Vec<String> = text
        .split(|c: char| c.is_whitespace() || c == '-')
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect();

    tokens
        .windows(2)
        .filter(|pair| {
            pair[0] == pair[1] && pair[0].chars().count() <= STUTTER_TOKEN_MAX_CHARS
        })
        .count() as u32
}

/// A flushed unit of transcript text for one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptChunk {
    pub room_id: String,
    pub text: String,
    pub metadata: FlushMetadata,
}

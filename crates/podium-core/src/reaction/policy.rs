//! Stage 1: deterministic heuristic scorer.
//!
//! Given the same text, persona, flush metadata and recent-emoji history the
//! engine always produces the same reaction.

use super::model::{Bucket, Reaction};
use super::table::ReactionTable;
use crate::bot::BotState;
use crate::config::EngineConfig;
use crate::persona::{Domain, Persona, Stance};
use crate::transcript::FlushMetadata;

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "best", "breakthrough", "excellent", "exciting", "fantastic", "good",
    "great", "happy", "improved", "incredible", "innovative", "love", "proud", "record",
    "strong", "success", "thrilled", "win",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "broken", "bug", "concern", "crisis", "cut", "cuts", "debt", "decline", "delay",
    "delayed", "fail", "failed", "failure", "layoffs", "loss", "losses", "missed", "problem",
    "risk", "terrible", "worst",
];

const TECH_WORDS: &[&str] = &[
    "ai", "algorithm", "api", "cloud", "code", "data", "engineering", "infrastructure",
    "latency", "model", "platform", "scale", "software", "stack",
];

const DESIGN_WORDS: &[&str] = &[
    "accessibility", "aesthetic", "brand", "design", "experience", "interface", "layout",
    "prototype", "ui", "user", "users", "ux", "visual",
];

const FINANCE_WORDS: &[&str] = &[
    "budget", "cash", "cost", "costs", "earnings", "funding", "growth", "investment", "margin",
    "margins", "profit", "quarter", "quarterly", "revenue", "roi", "sustainable", "valuation",
];

fn domain_words(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Tech => TECH_WORDS,
        Domain::Design => DESIGN_WORDS,
        Domain::Finance => FINANCE_WORDS,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn count_hits(tokens: &[String], words: &[&str]) -> i32 {
    tokens
        .iter()
        .filter(|token| words.iter().any(|word| *word == token.as_str()))
        .count() as i32
}

/// Output of a stage 1 decision.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicReaction {
    pub bucket: Bucket,
    pub reaction: Reaction,
    /// The table emoji was replaced to avoid repeating the previous one.
    pub substituted: bool,
}

/// Heuristic scorer backed by a [`ReactionTable`].
#[derive(Debug, Clone, Default)]
pub struct ReactionPolicyEngine {
    table: ReactionTable,
}

impl ReactionPolicyEngine {
    pub fn new(table: ReactionTable) -> Self {
        Self { table }
    }

    /// Built-in table plus the configured override rules.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(ReactionTable::with_overrides(&config.reactions))
    }

    pub fn table(&self) -> &ReactionTable {
        &self.table
    }

    /// Scores `text` into a bucket and applies the stance corrections.
    pub fn classify(&self, text: &str, persona: &Persona, metadata: &FlushMetadata) -> Bucket {
        let tokens = tokenize(text);
        let positive = count_hits(&tokens, POSITIVE_WORDS);
        let negative = count_hits(&tokens, NEGATIVE_WORDS);
        let domain_hits = count_hits(&tokens, domain_words(persona.domain));

        let mut net = positive - negative;
        match persona.stance {
            Stance::Supportive if metadata.is_exclamation => net += 1,
            Stance::Skeptical => {
                if metadata.is_exclamation {
                    net -= 1;
                }
                // praise inside the skeptic's own field reads as a claim to check
                if domain_hits > 0 && positive > 0 {
                    net -= 1;
                }
            }
            _ => {}
        }

        let mut bucket = if metadata.is_question {
            Bucket::Curious
        } else if net > 0 {
            Bucket::Positive
        } else if net < 0 {
            Bucket::Negative
        } else if domain_hits > 0 {
            Bucket::Curious
        } else {
            Bucket::Neutral
        };

        bucket = match (bucket, persona.stance) {
            (Bucket::Neutral, Stance::Supportive) => Bucket::Positive,
            (Bucket::Neutral, Stance::Skeptical) => Bucket::Curious,
            (other, _) => other,
        };

        if metadata.has_stutter() {
            bucket = match persona.stance {
                Stance::Supportive => Bucket::Positive,
                _ => Bucket::Curious,
            };
        }

        if metadata.has_rhetorical_pause && matches!(bucket, Bucket::Neutral | Bucket::Curious) {
            bucket = Bucket::Anticipation;
        }

        bucket
    }

    /// Runs stage 1 for one bot and records the chosen emoji.
    ///
    /// The phrase rotates with the length of the bot's recent-emoji history.
    /// If the table emoji equals the last remembered one, the second most
    /// recent emoji is used instead.
    pub fn react(
        &self,
        text: &str,
        persona: &Persona,
        metadata: &FlushMetadata,
        state: &mut BotState,
    ) -> HeuristicReaction {
        let bucket = self.classify(text, persona, metadata);
        let rule = self.table.lookup(bucket, persona.stance, persona.domain);

        let phrase = if rule.phrases.is_empty() {
            ""
        } else {
            rule.phrases[state.recent_emoji_count() % rule.phrases.len()].as_str()
        };

        let mut emoji = rule.emoji.as_str();
        let mut substituted = false;
        if state.last_emoji() == Some(emoji) {
            if let Some(previous) = state.previous_emoji() {
                substituted = previous != emoji;
                emoji = previous;
            }
        }

        let reaction = Reaction::new(emoji, phrase, rule.score_delta);
        state.remember_emoji(reaction.emoji.clone());

        HeuristicReaction {
            bucket,
            reaction,
            substituted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeptic() -> Persona {
        Persona::new("Critical Thinker", Stance::Skeptical, Domain::Finance, 0.3, 0.6)
    }

    fn supporter() -> Persona {
        Persona::new("Engaged Student", Stance::Supportive, Domain::Tech, 0.1, 0.8)
    }

    fn curious() -> Persona {
        Persona::new("Curious Designer", Stance::Curious, Domain::Design, 0.1, 0.9)
    }

    fn classify(persona: &Persona, text: &str) -> Bucket {
        ReactionPolicyEngine::default().classify(text, persona, &FlushMetadata::analyze(text))
    }

    #[test]
    fn test_question_is_curious_for_skeptic() {
        let engine = ReactionPolicyEngine::default();
        let text = "Is this sustainable?";
        let mut state = BotState::default();
        let result = engine.react(text, &skeptic(), &FlushMetadata::analyze(text), &mut state);

        assert_eq!(result.bucket, Bucket::Curious);
        assert_eq!(result.reaction.emoji, "U+1F9D0");
        assert_eq!(result.reaction.phrase, "Show the numbers");
        assert_eq!(result.reaction.score_delta, 0);
        assert_eq!(state.last_emoji(), Some("U+1F9D0"));
    }

    #[test]
    fn test_stance_never_lands_on_neutral() {
        let flat = "We will now look at the agenda";
        assert_eq!(classify(&supporter(), flat), Bucket::Positive);
        assert_eq!(classify(&skeptic(), flat), Bucket::Curious);
        assert_eq!(classify(&curious(), flat), Bucket::Neutral);
    }

    #[test]
    fn test_sentiment_buckets() {
        assert_eq!(classify(&curious(), "This is a great and exciting result"), Bucket::Positive);
        assert_eq!(classify(&curious(), "We had a terrible failure"), Bucket::Negative);
        // skeptics discount praise about their own domain
        assert_eq!(classify(&skeptic(), "Great revenue this quarter"), Bucket::Curious);
        assert_eq!(classify(&supporter(), "Great revenue this quarter"), Bucket::Positive);
    }

    #[test]
    fn test_stutter_and_pause_corrections() {
        assert_eq!(classify(&supporter(), "We we had a terrible failure"), Bucket::Positive);
        assert_eq!(classify(&skeptic(), "I I love it"), Bucket::Curious);
        assert_eq!(classify(&curious(), "And the answer is..."), Bucket::Anticipation);
        assert_eq!(classify(&skeptic(), "Our margins are..."), Bucket::Anticipation);
    }

    #[test]
    fn test_phrase_rotates_with_history_length() {
        let engine = ReactionPolicyEngine::default();
        let text = "Is this sustainable?";
        let meta = FlushMetadata::analyze(text);
        let mut state = BotState::default();
        state.remember_emoji("U+1F44F");

        let result = engine.react(text, &skeptic(), &meta, &mut state);
        assert_eq!(result.reaction.phrase, "Sustainable how?");
    }

    #[test]
    fn test_anti_repetition_substitutes_previous_emoji() {
        let engine = ReactionPolicyEngine::default();
        let text = "Is this sustainable?";
        let meta = FlushMetadata::analyze(text);
        let mut state = BotState::default();
        state.remember_emoji("U+1F62C");
        state.remember_emoji("U+1F9D0");

        let result = engine.react(text, &skeptic(), &meta, &mut state);
        assert!(result.substituted);
        assert_eq!(result.reaction.emoji, "U+1F62C");
        assert_eq!(state.last_emoji(), Some("U+1F62C"));

        // a single remembered emoji has nothing to substitute with
        let mut state = BotState::default();
        state.remember_emoji("U+1F9D0");
        let result = engine.react(text, &skeptic(), &meta, &mut state);
        assert!(!result.substituted);
        assert_eq!(result.reaction.emoji, "U+1F9D0");
    }
}

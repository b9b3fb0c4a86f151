//! (bucket, stance, domain) → reaction lookup.

use serde::{Deserialize, Serialize};

use super::model::{Bucket, MAX_PHRASE_WORDS, SCORE_DELTA_MAX, SCORE_DELTA_MIN};
use crate::error::{PodiumError, Result};
use crate::persona::{Domain, Stance};

/// One row of the reaction table.
///
/// `stance` and `domain` are wildcards when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRule {
    pub bucket: Bucket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stance: Option<Stance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    pub emoji: String,
    pub phrases: Vec<String>,
    #[serde(default)]
    pub score_delta: i32,
}

impl ReactionRule {
    pub fn new(bucket: Bucket, emoji: &str, phrases: &[&str], score_delta: i32) -> Self {
        Self {
            bucket,
            stance: None,
            domain: None,
            emoji: emoji.to_string(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            score_delta,
        }
    }

    pub fn for_stance(mut self, stance: Stance) -> Self {
        self.stance = Some(stance);
        self
    }

    pub fn for_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.emoji.trim().is_empty() {
            return Err(PodiumError::config(format!(
                "reaction rule for '{}' has an empty emoji",
                self.bucket
            )));
        }
        if self.phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(PodiumError::config(format!(
                "reaction rule for '{}' needs at least one phrase",
                self.bucket
            )));
        }
        if let Some(long) = self
            .phrases
            .iter()
            .find(|p| p.split_whitespace().count() > MAX_PHRASE_WORDS)
        {
            return Err(PodiumError::config(format!(
                "reaction rule for '{}' has phrase '{long}' longer than {MAX_PHRASE_WORDS} words",
                self.bucket
            )));
        }
        if !(SCORE_DELTA_MIN..=SCORE_DELTA_MAX).contains(&self.score_delta) {
            return Err(PodiumError::config(format!(
                "reaction rule for '{}' has score_delta {} outside [{SCORE_DELTA_MIN}, {SCORE_DELTA_MAX}]",
                self.bucket, self.score_delta
            )));
        }
        Ok(())
    }

    /// Match score, or `None` when a non-wildcard field differs.
    ///
    /// A stance match outweighs a domain match.
    fn specificity(&self, bucket: Bucket, stance: Stance, domain: Domain) -> Option<u8> {
        if self.bucket != bucket {
            return None;
        }
        let mut score = 0;
        match self.stance {
            Some(s) if s != stance => return None,
            Some(_) => score += 2,
            None => {}
        }
        match self.domain {
            Some(d) if d != domain => return None,
            Some(_) => score += 1,
            None => {}
        }
        Some(score)
    }
}

/// Ordered reaction rules with a guaranteed fallback row.
#[derive(Debug, Clone)]
pub struct ReactionTable {
    rules: Vec<ReactionRule>,
    default_rule: ReactionRule,
}

impl Default for ReactionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReactionTable {
    /// The built-in table. Every bucket has a wildcard row.
    pub fn builtin() -> Self {
        use Bucket::*;
        use Domain::*;
        use Stance::{Skeptical, Supportive};

        let rules = vec![
            // positive
            ReactionRule::new(Positive, "U+1F680", &["Ship it", "Love this stack"], 3)
                .for_stance(Supportive)
                .for_domain(Tech),
            ReactionRule::new(Positive, "U+1F64C", &["Yes!", "Love it", "So true"], 2)
                .for_stance(Supportive),
            ReactionRule::new(Positive, "U+1F44D", &["Fair point", "Okay, convincing"], 1)
                .for_stance(Skeptical),
            ReactionRule::new(Positive, "U+1F4A1", &["Oh, interesting", "Good insight"], 2)
                .for_stance(Stance::Curious),
            ReactionRule::new(Positive, "U+1F4C8", &["Numbers look good", "Solid growth"], 2)
                .for_domain(Finance),
            ReactionRule::new(Positive, "U+1F3A8", &["Beautiful", "Nice craft"], 2)
                .for_domain(Design),
            ReactionRule::new(Positive, "U+1F44F", &["Great point", "Nice"], 2),
            // negative
            ReactionRule::new(Negative, "U+1F4B8", &["Burning cash", "Margins?"], -2)
                .for_stance(Skeptical)
                .for_domain(Finance),
            ReactionRule::new(Negative, "U+1F644", &["Not convinced", "Heard that before"], -2)
                .for_stance(Skeptical),
            ReactionRule::new(Negative, "U+1F615", &["Hmm, rough", "Oh no"], -1)
                .for_stance(Supportive),
            ReactionRule::new(Negative, "U+1F928", &["Wait, what?", "Really?"], -1)
                .for_stance(Stance::Curious),
            ReactionRule::new(Negative, "U+1F62C", &["Yikes", "Not great"], -2),
            // neutral
            ReactionRule::new(Neutral, "U+1F642", &["Go on", "Tell me more"], 0)
                .for_stance(Stance::Curious),
            ReactionRule::new(Neutral, "U+1F610", &["Okay", "Noted"], 0),
            // curious
            ReactionRule::new(Curious, "U+1F9D0", &["Show the numbers", "Sustainable how?"], 0)
                .for_stance(Skeptical)
                .for_domain(Finance),
            ReactionRule::new(Curious, "U+1F9D0", &["Prove it", "Needs evidence"], 0)
                .for_stance(Skeptical),
            ReactionRule::new(Curious, "U+1F50D", &["Does it scale?", "Which stack?"], 1)
                .for_domain(Tech),
            ReactionRule::new(Curious, "U+1F440", &["Show me", "What's the flow?"], 1)
                .for_domain(Design),
            ReactionRule::new(Curious, "U+1F914", &["Why though?", "Tell me more"], 1),
            // anticipation
            ReactionRule::new(Anticipation, "U+1F929", &["Here it comes", "Can't wait"], 1)
                .for_stance(Supportive),
            ReactionRule::new(Anticipation, "U+1F636", &["Waiting...", "Get on with it"], 0)
                .for_stance(Skeptical),
            ReactionRule::new(Anticipation, "U+1F440", &["And then?", "Go on..."], 1),
        ];

        Self {
            rules,
            default_rule: ReactionRule::new(Neutral, "U+1F610", &["Okay"], 0),
        }
    }

    /// Built-in table with `overrides` taking precedence on equal specificity.
    pub fn with_overrides(overrides: &[ReactionRule]) -> Self {
        let mut table = Self::builtin();
        let mut rules = overrides.to_vec();
        rules.append(&mut table.rules);
        table.rules = rules;
        table
    }

    /// Most specific rule for the combination; always returns a rule.
    pub fn lookup(&self, bucket: Bucket, stance: Stance, domain: Domain) -> &ReactionRule {
        let mut best: Option<(u8, &ReactionRule)> = None;
        for rule in &self.rules {
            if let Some(score) = rule.specificity(bucket, stance, domain) {
                // strict comparison keeps the first declared rule on ties
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, rule));
                }
            }
        }
        best.map(|(_, rule)| rule).unwrap_or(&self.default_rule)
    }

    pub fn rules(&self) -> &[ReactionRule] {
        &self.rules
    }
}

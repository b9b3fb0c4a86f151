use serde::{Deserialize, Serialize};

use super::gate::GateOutcome;
use super::model::{Bucket, Reaction};

/// Which branch produced the final reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    /// Suppression roll fired; no reaction was produced.
    Suppressed,
    /// Stage 1 without escalation.
    Heuristic,
    /// Stage 2 answered in time.
    Generated,
    /// Stage 2 ran out of budget; the thinking placeholder was used.
    TimedOut,
    /// Stage 2 failed; stage 1 was used instead.
    Fallback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDecision {
    /// Question chunk and escalation-eligible stance.
    pub eligible: bool,
    pub selected: bool,
}

/// Everything one (chunk, bot) unit of work decided, built once and shared
/// between emission and the `reaction_debug` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub room_id: String,
    pub bot_id: String,
    pub path: DecisionPath,
    pub bucket: Option<Bucket>,
    pub escalation: EscalationDecision,
    pub generation_ms: Option<u64>,
    pub generation_error: Option<String>,
    pub gate: Option<GateOutcome>,
    pub emitted: bool,
    pub reaction: Option<Reaction>,
    pub elapsed_ms: u64,
}

impl DecisionRecord {
    pub fn new(room_id: impl Into<String>, bot_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            bot_id: bot_id.into(),
            path: DecisionPath::Suppressed,
            bucket: None,
            escalation: EscalationDecision::default(),
            generation_ms: None,
            generation_error: None,
            gate: None,
            emitted: false,
            reaction: None,
            elapsed_ms: 0,
        }
    }

    /// The reaction that was actually published, if any.
    pub fn emitted_reaction(&self) -> Option<&Reaction> {
        if self.emitted { self.reaction.as_ref() } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_suppressed_and_silent() {
        let record = DecisionRecord::new("room", "bot");
        assert_eq!(record.path, DecisionPath::Suppressed);
        assert!(record.emitted_reaction().is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut record = DecisionRecord::new("room", "bot");
        record.path = DecisionPath::TimedOut;
        record.reaction = Some(Reaction::thinking());
        record.gate = Some(GateOutcome::Admitted);
        record.emitted = true;

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["roomId"], "room");
        assert_eq!(json["path"], "timed_out");
        assert_eq!(json["gate"]["outcome"], "admitted");
        assert_eq!(json["reaction"]["emoji"], "U+23F3");
    }
}

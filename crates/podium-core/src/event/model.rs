use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bot::BotSnapshot;
use crate::coach::CoachFeedback;
use crate::error::Result;
use crate::reaction::{DecisionRecord, Reaction};
use crate::transcript::TranscriptChunk;

/// Outbound events, serialized as `{ "event": <kind>, "payload": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum Event {
    /// Sent to an observer as soon as it connects.
    Ready(ReadyPayload),
    Transcript(TranscriptChunk),
    Join(JoinPayload),
    Leave(LeavePayload),
    Reaction(ReactionPayload),
    ReactionDebug(DecisionRecord),
    CoachFeedback(CoachFeedbackPayload),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Ready(_) => EventKind::Ready,
            Event::Transcript(_) => EventKind::Transcript,
            Event::Join(_) => EventKind::Join,
            Event::Leave(_) => EventKind::Leave,
            Event::Reaction(_) => EventKind::Reaction,
            Event::ReactionDebug(_) => EventKind::ReactionDebug,
            Event::CoachFeedback(_) => EventKind::CoachFeedback,
        }
    }

    pub fn room_id(&self) -> &str {
        match self {
            Event::Ready(p) => &p.room_id,
            Event::Transcript(chunk) => &chunk.room_id,
            Event::Join(p) => &p.room_id,
            Event::Leave(p) => &p.room_id,
            Event::Reaction(p) => &p.room_id,
            Event::ReactionDebug(record) => &record.room_id,
            Event::CoachFeedback(p) => &p.room_id,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Subscription topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Ready,
    Transcript,
    Join,
    Leave,
    Reaction,
    ReactionDebug,
    CoachFeedback,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Ready,
        EventKind::Transcript,
        EventKind::Join,
        EventKind::Leave,
        EventKind::Reaction,
        EventKind::ReactionDebug,
        EventKind::CoachFeedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ready => "ready",
            EventKind::Transcript => "transcript",
            EventKind::Join => "join",
            EventKind::Leave => "leave",
            EventKind::Reaction => "reaction",
            EventKind::ReactionDebug => "reaction_debug",
            EventKind::CoachFeedback => "coach_feedback",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub room_id: String,
    pub bot: BotSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    pub room_id: String,
    pub bot_id: String,
    /// `removed` or `disengaged`
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    pub room_id: String,
    pub bot_id: String,
    pub reaction: Reaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachFeedbackPayload {
    pub room_id: String,
    pub feedback: CoachFeedback,
}

/// Inbound messages accepted from a client connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    ClientTranscript { text: String },
}

#[derive(Deserialize)]
struct RawEnvelope {
    event: String,
}

impl ClientMessage {
    /// Parses a raw client frame.
    ///
    /// Frames with an unknown `event` resolve to `Ok(None)`; frames that are
    /// not an envelope at all, or a known event with a bad payload, are errors.
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        let envelope: RawEnvelope = serde_json::from_str(raw)?;
        if envelope.event != "client_transcript" {
            tracing::debug!(event = %envelope.event, "Ignoring inbound client event");
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(raw)?))
    }
}

//! The live audience use case.
//!
//! `LiveAudience` owns one instance of every engine component and performs all
//! subscriptions once at construction:
//!
//! - `transcript` → `RoomRegistry` (history, coach), then `ReactionScheduler`
//! - every kind → `ObserverHub`
//!
//! Nothing here is global; several audiences can coexist in one process.

use podium_core::bot::Bot;
use podium_core::coach::{Coach, CoachFeedback};
use podium_core::config::EngineConfig;
use podium_core::event::{
    ClientMessage, CoachFeedbackPayload, Event, EventDispatcher, EventKind, JoinPayload, LeavePayload,
};
use podium_core::reaction::{ReactionGenerator, ReactionPolicyEngine};
use podium_core::room::{RoomRegistry, RoomSnapshot};
use podium_core::transcript::{FlushOutcome, TranscriptBuffer};
use podium_execution::ReactionScheduler;
use std::sync::Arc;

use crate::observer_hub::{Observer, ObserverHub};

/// Reason attached to `leave` events for explicitly removed bots.
pub const REMOVED_REASON: &str = "removed";

pub struct LiveAudience {
    config: EngineConfig,
    registry: Arc<RoomRegistry>,
    buffer: TranscriptBuffer,
    dispatcher: Arc<EventDispatcher>,
    scheduler: Arc<ReactionScheduler>,
    hub: Arc<ObserverHub>,
}

impl LiveAudience {
    pub fn new(config: EngineConfig, generator: Arc<dyn ReactionGenerator>) -> Self {
        let registry = Arc::new(RoomRegistry::new(config.room.clone()));
        let buffer = TranscriptBuffer::from_config(&config.buffer);
        let dispatcher = Arc::new(EventDispatcher::new());
        let scheduler = ReactionScheduler::new(
            Arc::clone(&registry),
            generator,
            ReactionPolicyEngine::from_config(&config),
            config.scheduler.clone(),
        );
        let hub = Arc::new(ObserverHub::new());

        dispatcher.subscribe(EventKind::Transcript, registry.clone());
        dispatcher.subscribe(EventKind::Transcript, scheduler.clone());
        dispatcher.subscribe_all(hub.clone());

        Self {
            config,
            registry,
            buffer,
            dispatcher,
            scheduler,
            hub,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn hub(&self) -> &Arc<ObserverHub> {
        &self.hub
    }

    /// Connects an observer to a room, creating the room if needed.
    pub fn connect(&self, room_id: &str) -> anyhow::Result<Observer> {
        self.registry.ensure_room(room_id);
        Ok(self.hub.connect(room_id)?)
    }

    /// Feeds one transcript fragment and publishes the chunk if it flushed.
    ///
    /// Reaction work is spawned onto the current tokio runtime and is still in
    /// flight when this returns.
    pub fn ingest(&self, room_id: &str, fragment: &str) -> FlushOutcome {
        let outcome = self.buffer.append(room_id, fragment);
        self.publish_flush(room_id, outcome.clone());
        outcome
    }

    /// Flushes whatever is pending for the room regardless of terminators.
    pub fn flush(&self, room_id: &str) -> FlushOutcome {
        let outcome = self.buffer.flush_now(room_id);
        self.publish_flush(room_id, outcome.clone());
        outcome
    }

    fn publish_flush(&self, room_id: &str, outcome: FlushOutcome) {
        if let Some(chunk) = outcome.into_chunk(room_id) {
            tracing::debug!(room_id, text = %chunk.text, "Transcript flushed");
            self.dispatcher.publish(Event::Transcript(chunk));
        }
    }

    /// Handles a raw inbound client frame.
    ///
    /// Unknown client events are ignored and yield `Ok(None)`.
    pub fn handle_client_message(&self, room_id: &str, raw: &str) -> anyhow::Result<Option<FlushOutcome>> {
        match ClientMessage::parse(raw)? {
            Some(ClientMessage::ClientTranscript { text }) => Ok(Some(self.ingest(room_id, &text))),
            None => Ok(None),
        }
    }

    /// Adds a bot and announces it with `join`. Returns `false` on a duplicate id.
    pub fn add_bot(&self, room_id: &str, bot: Arc<Bot>) -> bool {
        let snapshot = bot.snapshot();
        if !self.registry.add_bot(room_id, bot) {
            tracing::warn!(room_id, bot_id = %snapshot.id, "Bot id already in room");
            return false;
        }
        self.dispatcher.publish(Event::Join(JoinPayload {
            room_id: room_id.to_string(),
            bot: snapshot,
        }));
        true
    }

    /// Removes a bot; publishes `leave` only when one was actually removed.
    pub fn remove_bot(&self, room_id: &str, bot_id: &str) -> bool {
        if self.registry.remove_bot(room_id, bot_id).is_none() {
            return false;
        }
        self.dispatcher.publish(Event::Leave(LeavePayload {
            room_id: room_id.to_string(),
            bot_id: bot_id.to_string(),
            reason: REMOVED_REASON.to_string(),
        }));
        true
    }

    pub fn snapshot(&self, room_id: &str) -> RoomSnapshot {
        self.registry.snapshot(room_id)
    }

    pub fn attach_coach(&self, room_id: &str, coach: Arc<dyn Coach>) {
        self.registry.attach_coach(room_id, coach);
    }

    /// Waits until every reaction task spawned so far has finished.
    pub async fn wait_idle(&self) {
        self.scheduler.wait_idle().await;
    }

    /// Asks the room's coach for feedback and publishes it as `coach_feedback`.
    pub async fn end_session(&self, room_id: &str) -> Option<CoachFeedback> {
        let coach = self.registry.coach(room_id)?;
        let feedback = coach.generate_end_session_feedback().await?;
        tracing::info!(room_id, "Publishing coach feedback");
        self.dispatcher.publish(Event::CoachFeedback(CoachFeedbackPayload {
            room_id: room_id.to_string(),
            feedback: feedback.clone(),
        }));
        Some(feedback)
    }
}

impl std::fmt::Debug for LiveAudience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveAudience")
            .field("rooms", &self.registry.room_ids())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

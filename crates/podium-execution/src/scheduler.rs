//! Per-bot reaction scheduling.
//!
//! Every flushed chunk fans out into one independent task per present bot.
//! A task runs suppression, escalation, the optional generator call under its
//! timeout budget, an optional jitter delay, then gating and emission. Tasks
//! for different bots never wait on each other; tasks for the same bot only
//! meet inside that bot's state lock, which is never held across an await.

use chrono::Utc;
use podium_core::bot::Bot;
use podium_core::config::SchedulerConfig;
use podium_core::error::{PodiumError, Result};
use podium_core::event::{Event, EventDispatcher, EventHandler, LeavePayload, ReactionPayload};
use podium_core::persona::Stance;
use podium_core::reaction::{
    DecisionPath, DecisionRecord, EscalationDecision, GateKeeper, Reaction, ReactionGenerator,
    ReactionPolicyEngine,
};
use podium_core::room::RoomRegistry;
use podium_core::transcript::{FlushMetadata, TranscriptChunk};
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Reason attached to `leave` events for bots that lost interest.
pub const DISENGAGED_REASON: &str = "disengaged";

fn roll() -> f64 {
    rand::thread_rng().gen_range(0.0..1.0)
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Orchestrates stage 1, stage 2 and the gate for every bot in a room.
pub struct ReactionScheduler {
    registry: Arc<RoomRegistry>,
    generator: Arc<dyn ReactionGenerator>,
    policy: ReactionPolicyEngine,
    gate: GateKeeper,
    config: SchedulerConfig,
    /// Tasks spawned through the event handler path, for [`Self::wait_idle`].
    in_flight: Mutex<Vec<JoinHandle<DecisionRecord>>>,
    this: Weak<Self>,
}

impl ReactionScheduler {
    pub fn new(
        registry: Arc<RoomRegistry>,
        generator: Arc<dyn ReactionGenerator>,
        policy: ReactionPolicyEngine,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            registry,
            generator,
            policy,
            gate: GateKeeper::new(config.stutter_boost),
            config,
            in_flight: Mutex::new(Vec::new()),
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Escalation is eligible for question chunks and configured stances.
    /// The base roll can select any bot; eligibility adds the bias roll.
    pub fn decide_escalation(
        &self,
        stance: Stance,
        metadata: &FlushMetadata,
        base_roll: f64,
        bias_roll: f64,
    ) -> EscalationDecision {
        let eligible = metadata.is_question && self.config.is_escalation_stance(stance);
        let selected = base_roll < self.config.base_escalation_probability
            || (eligible && bias_roll < self.config.escalation_bias);
        EscalationDecision { eligible, selected }
    }

    /// Spawns one unit of work per present bot in the chunk's room.
    ///
    /// Returns immediately; the handles resolve to each unit's decision record.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn fan_out(
        self: &Arc<Self>,
        chunk: TranscriptChunk,
        dispatcher: Arc<EventDispatcher>,
    ) -> Result<Vec<JoinHandle<DecisionRecord>>> {
        let runtime = Handle::try_current()
            .map_err(|err| PodiumError::internal(format!("reaction fan-out needs a tokio runtime: {err}")))?;

        let bots = self.registry.present_bots(&chunk.room_id);
        tracing::debug!(room_id = %chunk.room_id, bots = bots.len(), "Fanning out chunk");

        let chunk = Arc::new(chunk);
        let handles = bots
            .into_iter()
            .map(|bot| {
                let scheduler = Arc::clone(self);
                let chunk = Arc::clone(&chunk);
                let dispatcher = Arc::clone(&dispatcher);
                runtime.spawn(async move { scheduler.run_unit(bot, chunk, dispatcher).await })
            })
            .collect();
        Ok(handles)
    }

    /// Waits for every task spawned through the event handler path,
    /// including tasks spawned while waiting.
    pub async fn wait_idle(&self) {
        loop {
            let pending = {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *in_flight)
            };
            if pending.is_empty() {
                return;
            }
            for result in futures::future::join_all(pending).await {
                if let Err(err) = result {
                    tracing::warn!("Reaction task failed: {}", err);
                }
            }
        }
    }

    fn track(&self, handles: Vec<JoinHandle<DecisionRecord>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.extend(handles);
    }

    /// One (chunk, bot) unit of work.
    async fn run_unit(
        self: Arc<Self>,
        bot: Arc<Bot>,
        chunk: Arc<TranscriptChunk>,
        dispatcher: Arc<EventDispatcher>,
    ) -> DecisionRecord {
        let started = Instant::now();
        let mut record = DecisionRecord::new(&chunk.room_id, bot.id());
        let persona = bot.persona();

        if roll() < self.config.suppression_probability {
            record.path = DecisionPath::Suppressed;
            return self.finish(record, started, &dispatcher);
        }

        record.escalation = self.decide_escalation(persona.stance, &chunk.metadata, roll(), roll());

        let reaction = if record.escalation.selected {
            self.stage_two(&bot, &chunk, &mut record).await
        } else {
            record.path = DecisionPath::Heuristic;
            self.stage_one(&bot, &chunk, &mut record)
        };

        let max_jitter = self.config.max_jitter();
        if !max_jitter.is_zero() {
            let delay = rand::thread_rng().gen_range(Duration::ZERO..=max_jitter);
            tokio::time::sleep(delay).await;
        }

        let now = Instant::now();
        let (gate, departed) = bot.with_state(|state| {
            if !state.present {
                return (None, false);
            }
            let outcome = self.gate.should_emit(state, persona.stance, &chunk.metadata, now);
            let departed = outcome.is_admitted()
                && self.config.track_engagement
                && !reaction.is_thinking()
                && state.apply_score_delta(reaction.score_delta, Utc::now(), self.config.departure_threshold);
            (Some(outcome), departed)
        });

        record.gate = gate;
        record.emitted = gate.is_some_and(|outcome| outcome.is_admitted());
        record.reaction = Some(reaction.clone());

        if record.emitted {
            tracing::debug!(
                room_id = %chunk.room_id,
                bot_id = bot.id(),
                path = ?record.path,
                emoji = %reaction.emoji,
                "Emitting reaction"
            );
            dispatcher.publish(Event::Reaction(ReactionPayload {
                room_id: chunk.room_id.clone(),
                bot_id: bot.id().to_string(),
                reaction,
            }));
        }

        if departed {
            tracing::info!(room_id = %chunk.room_id, bot_id = bot.id(), "Bot disengaged and left");
            dispatcher.publish(Event::Leave(LeavePayload {
                room_id: chunk.room_id.clone(),
                bot_id: bot.id().to_string(),
                reason: DISENGAGED_REASON.to_string(),
            }));
        }

        self.finish(record, started, &dispatcher)
    }

    fn stage_one(&self, bot: &Bot, chunk: &TranscriptChunk, record: &mut DecisionRecord) -> Reaction {
        let heuristic = bot.with_state(|state| {
            self.policy
                .react(&chunk.text, bot.persona(), &chunk.metadata, state)
        });
        record.bucket = Some(heuristic.bucket);
        heuristic.reaction
    }

    async fn stage_two(&self, bot: &Bot, chunk: &TranscriptChunk, record: &mut DecisionRecord) -> Reaction {
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.config.generation_timeout(),
            self.generator.generate(bot.persona(), &chunk.text),
        )
        .await;
        record.generation_ms = Some(elapsed_ms(started));

        match outcome {
            Ok(Ok(reaction)) => {
                record.path = DecisionPath::Generated;
                bot.with_state(|state| state.remember_emoji(reaction.emoji.clone()));
                reaction
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    room_id = %chunk.room_id,
                    bot_id = bot.id(),
                    retryable = err.is_retryable(),
                    "Reaction generation failed, using heuristic: {}",
                    err
                );
                record.path = DecisionPath::Fallback;
                record.generation_error = Some(err.to_string());
                self.stage_one(bot, chunk, record)
            }
            Err(_) => {
                tracing::debug!(
                    room_id = %chunk.room_id,
                    bot_id = bot.id(),
                    timeout_ms = self.config.generation_timeout_ms,
                    "Reaction generation timed out"
                );
                record.path = DecisionPath::TimedOut;
                Reaction::thinking()
            }
        }
    }

    fn finish(&self, mut record: DecisionRecord, started: Instant, dispatcher: &Arc<EventDispatcher>) -> DecisionRecord {
        record.elapsed_ms = elapsed_ms(started);
        if self.config.debug_events {
            dispatcher.publish(Event::ReactionDebug(record.clone()));
        }
        record
    }
}

/// Fans out every flushed `transcript` event.
impl EventHandler for ReactionScheduler {
    fn name(&self) -> &str {
        "reaction_scheduler"
    }

    fn handle(&self, event: &Event, dispatcher: &Arc<EventDispatcher>) -> Result<()> {
        let Event::Transcript(chunk) = event else {
            return Ok(());
        };
        let Some(scheduler) = self.this.upgrade() else {
            return Err(PodiumError::handler(self.name(), "scheduler is shutting down"));
        };
        let handles = scheduler.fan_out(chunk.clone(), Arc::clone(dispatcher))?;
        self.track(handles);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use podium_core::bot::BotState;
    use podium_core::config::BotDefaults;
    use podium_core::event::EventKind;
    use podium_core::persona::{Domain, Persona};
    use podium_core::reaction::{GateOutcome, GenerationError, THINKING_EMOJI};

    const ROOM: &str = "room-1";

    struct FixedGenerator(Reaction);

    #[async_trait]
    impl ReactionGenerator for FixedGenerator {
        async fn generate(&self, _persona: &Persona, _text: &str) -> std::result::Result<Reaction, GenerationError> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ReactionGenerator for FailingGenerator {
        async fn generate(&self, _persona: &Persona, _text: &str) -> std::result::Result<Reaction, GenerationError> {
            Err(GenerationError::transport(Some(503), "overloaded", true))
        }
    }

    struct SlowGenerator(Duration);

    #[async_trait]
    impl ReactionGenerator for SlowGenerator {
        async fn generate(&self, _persona: &Persona, _text: &str) -> std::result::Result<Reaction, GenerationError> {
            tokio::time::sleep(self.0).await;
            Ok(Reaction::new("U+1F600", "Too late", 1))
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl ReactionGenerator for PanickingGenerator {
        async fn generate(&self, persona: &Persona, _text: &str) -> std::result::Result<Reaction, GenerationError> {
            if persona.name == "Fragile" {
                panic!("generator blew up");
            }
            Ok(Reaction::new("U+1F44D", "Fair point", 1))
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn kinds(&self) -> Vec<EventKind> {
            self.events.lock().unwrap().iter().map(Event::kind).collect()
        }

        fn reactions(&self) -> Vec<ReactionPayload> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|event| match event {
                    Event::Reaction(payload) => Some(payload.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl EventHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn handle(&self, event: &Event, _dispatcher: &Arc<EventDispatcher>) -> Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Harness {
        scheduler: Arc<ReactionScheduler>,
        registry: Arc<RoomRegistry>,
        dispatcher: Arc<EventDispatcher>,
        recorder: Arc<Recorder>,
    }

    fn quiet_config(escalation_bias: f64) -> SchedulerConfig {
        SchedulerConfig {
            suppression_probability: 0.0,
            base_escalation_probability: 0.0,
            escalation_bias,
            max_jitter_ms: 0,
            generation_timeout_ms: 500,
            ..SchedulerConfig::default()
        }
    }

    fn always_reacting() -> BotDefaults {
        BotDefaults {
            engagement_score: 10.0,
            cooldown_secs: 3.0,
            reaction_probability: 1.0,
        }
    }

    fn harness(
        generator: Arc<dyn ReactionGenerator>,
        config: SchedulerConfig,
        defaults: BotDefaults,
        personas: Vec<Persona>,
    ) -> Harness {
        let registry = Arc::new(RoomRegistry::default());
        registry.ensure_room(ROOM);
        for persona in personas {
            let id = persona.name.clone();
            registry.add_bot(ROOM, Arc::new(Bot::with_id(id, persona, BotState::from_defaults(&defaults))));
        }
        let scheduler = ReactionScheduler::new(
            Arc::clone(&registry),
            generator,
            ReactionPolicyEngine::default(),
            config,
        );
        let dispatcher = Arc::new(EventDispatcher::new());
        let recorder = Arc::new(Recorder::default());
        dispatcher.subscribe_all(recorder.clone());
        Harness {
            scheduler,
            registry,
            dispatcher,
            recorder,
        }
    }

    fn chunk(text: &str) -> TranscriptChunk {
        TranscriptChunk {
            room_id: ROOM.to_string(),
            text: text.to_string(),
            metadata: FlushMetadata::analyze(text),
        }
    }

    fn skeptic(name: &str) -> Persona {
        Persona::new(name, Stance::Skeptical, Domain::Finance, 0.3, 0.6)
    }

    fn supporter(name: &str) -> Persona {
        Persona::new(name, Stance::Supportive, Domain::Tech, 0.1, 0.8)
    }

    async fn run_one(h: &Harness, text: &str) -> DecisionRecord {
        let mut handles = h.scheduler.fan_out(chunk(text), Arc::clone(&h.dispatcher)).unwrap();
        assert_eq!(handles.len(), 1);
        handles.remove(0).await.unwrap()
    }

    #[test]
    fn test_decide_escalation() {
        let h = harness(Arc::new(FailingGenerator), quiet_config(0.5), always_reacting(), vec![]);
        let question = FlushMetadata::analyze("Why now?");
        let statement = FlushMetadata::analyze("We shipped it.");

        let eligible = h.scheduler.decide_escalation(Stance::Skeptical, &question, 0.9, 0.1);
        assert!(eligible.eligible && eligible.selected);

        let unlucky = h.scheduler.decide_escalation(Stance::Curious, &question, 0.9, 0.7);
        assert!(unlucky.eligible && !unlucky.selected);

        let wrong_stance = h.scheduler.decide_escalation(Stance::Supportive, &question, 0.9, 0.0);
        assert!(!wrong_stance.eligible && !wrong_stance.selected);

        let no_question = h.scheduler.decide_escalation(Stance::Skeptical, &statement, 0.9, 0.0);
        assert!(!no_question.eligible && !no_question.selected);
    }

    #[test]
    fn test_base_roll_escalates_any_bot() {
        let config = SchedulerConfig {
            base_escalation_probability: 0.05,
            ..quiet_config(0.0)
        };
        let h = harness(Arc::new(FailingGenerator), config, always_reacting(), vec![]);
        let statement = FlushMetadata::analyze("We shipped it.");
        let decision = h.scheduler.decide_escalation(Stance::Supportive, &statement, 0.01, 0.99);
        assert!(!decision.eligible);
        assert!(decision.selected);
    }

    #[tokio::test]
    async fn test_non_eligible_bot_stays_heuristic() {
        let h = harness(
            Arc::new(FixedGenerator(Reaction::new("U+1F525", "On fire", 3))),
            quiet_config(1.0),
            always_reacting(),
            vec![supporter("Engaged Student")],
        );

        let record = run_one(&h, "Can we ship this today?").await;
        assert_eq!(record.path, DecisionPath::Heuristic);
        assert!(!record.escalation.eligible);
        assert!(record.bucket.is_some());
        assert!(record.emitted);
        assert_ne!(record.reaction.unwrap().emoji, "U+1F525");
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back_to_heuristic() {
        let h = harness(
            Arc::new(FailingGenerator),
            quiet_config(1.0),
            always_reacting(),
            vec![skeptic("Critical Thinker")],
        );

        let record = run_one(&h, "What does the revenue look like?").await;
        assert_eq!(record.path, DecisionPath::Fallback);
        assert!(record.generation_error.as_deref().unwrap().contains("overloaded"));
        assert!(record.emitted);

        let reactions = h.recorder.reactions();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].bot_id, "Critical Thinker");
        assert_eq!(reactions[0].reaction.emoji, "U+1F9D0");
        assert_eq!(reactions[0].reaction.phrase, "Show the numbers");
    }

    #[tokio::test]
    async fn test_timeout_emits_thinking_placeholder() {
        let config = SchedulerConfig {
            generation_timeout_ms: 20,
            ..quiet_config(1.0)
        };
        let h = harness(
            Arc::new(SlowGenerator(Duration::from_millis(300))),
            config,
            always_reacting(),
            vec![skeptic("Critical Thinker")],
        );

        let record = run_one(&h, "Is that sustainable?").await;
        assert_eq!(record.path, DecisionPath::TimedOut);
        assert!(record.emitted);
        assert!(record.generation_ms.unwrap() < 300);

        let reactions = h.recorder.reactions();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].reaction.emoji, THINKING_EMOJI);
        assert_eq!(reactions[0].reaction.score_delta, 0);

        let bot = h.registry.bot(ROOM, "Critical Thinker").unwrap();
        assert_eq!(bot.snapshot().engagement_score, 10.0);
        assert!(bot.with_state(|state| state.engagement_history.is_empty()));
    }

    #[tokio::test]
    async fn test_generated_reaction_updates_bot_state() {
        let h = harness(
            Arc::new(FixedGenerator(Reaction::new("U+1F914", "Prove it", -2))),
            quiet_config(1.0),
            always_reacting(),
            vec![skeptic("Critical Thinker")],
        );

        let record = run_one(&h, "Should we double the budget?").await;
        assert_eq!(record.path, DecisionPath::Generated);
        assert!(record.bucket.is_none());
        assert_eq!(record.emitted_reaction().unwrap().phrase, "Prove it");

        let bot = h.registry.bot(ROOM, "Critical Thinker").unwrap();
        assert_eq!(bot.with_state(|state| state.last_emoji().map(str::to_string)), Some("U+1F914".to_string()));
        assert_eq!(bot.snapshot().engagement_score, 8.0);
    }

    #[tokio::test]
    async fn test_suppressed_bot_publishes_nothing() {
        let config = SchedulerConfig {
            suppression_probability: 1.0,
            ..quiet_config(1.0)
        };
        let h = harness(
            Arc::new(FailingGenerator),
            config,
            always_reacting(),
            vec![skeptic("Critical Thinker")],
        );

        let record = run_one(&h, "What about churn?").await;
        assert_eq!(record.path, DecisionPath::Suppressed);
        assert!(!record.emitted);
        assert!(record.gate.is_none());
        assert!(h.recorder.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_cooldown_blocks_back_to_back_reactions() {
        let h = harness(
            Arc::new(FailingGenerator),
            quiet_config(0.0),
            always_reacting(),
            vec![supporter("Engaged Student")],
        );

        let first = run_one(&h, "We launched on time.").await;
        assert_eq!(first.gate, Some(GateOutcome::Admitted));

        let second = run_one(&h, "And under budget.").await;
        assert!(matches!(second.gate, Some(GateOutcome::Cooldown { .. })));
        assert!(!second.emitted);
        assert_eq!(h.recorder.reactions().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_chunks_for_one_bot_emit_once() {
        let config = SchedulerConfig {
            max_jitter_ms: 20,
            ..quiet_config(1.0)
        };
        let h = harness(
            Arc::new(SlowGenerator(Duration::from_millis(100))),
            config,
            always_reacting(),
            vec![skeptic("Critical Thinker")],
        );

        // questions escalate into the slow generator, statements stay heuristic
        let mut handles = Vec::new();
        for i in 0..20 {
            let text = if i % 2 == 0 {
                format!("Is chunk {i} sustainable?")
            } else {
                format!("Chunk {i} is done.")
            };
            handles.extend(h.scheduler.fan_out(chunk(&text), Arc::clone(&h.dispatcher)).unwrap());
        }
        assert_eq!(handles.len(), 20);

        let records: Vec<DecisionRecord> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(records.iter().filter(|record| record.emitted).count(), 1);
        assert_eq!(h.recorder.reactions().len(), 1);
        for record in records.iter().filter(|record| !record.emitted) {
            if let Some(gate) = &record.gate {
                assert!(matches!(gate, GateOutcome::Cooldown { .. }), "unexpected gate {gate:?}");
            }
        }
        h.scheduler.wait_idle().await;
    }

    #[tokio::test]
    async fn test_jitter_stays_within_bound() {
        let config = SchedulerConfig {
            max_jitter_ms: 30,
            ..quiet_config(0.0)
        };
        let h = harness(
            Arc::new(FailingGenerator),
            config,
            always_reacting(),
            vec![supporter("Engaged Student")],
        );

        let started = Instant::now();
        let record = run_one(&h, "We launched on time.").await;
        assert!(record.emitted);
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_departure_publishes_leave() {
        let config = SchedulerConfig {
            departure_threshold: -3.0,
            ..quiet_config(1.0)
        };
        let defaults = BotDefaults {
            engagement_score: 0.0,
            ..always_reacting()
        };
        let h = harness(
            Arc::new(FixedGenerator(Reaction::new("U+1F612", "Not convinced", -5))),
            config,
            defaults,
            vec![skeptic("Critical Thinker")],
        );

        let record = run_one(&h, "Any questions?").await;
        assert!(record.emitted);
        assert_eq!(h.recorder.kinds(), vec![EventKind::Reaction, EventKind::Leave]);
        assert!(h.registry.present_bots(ROOM).is_empty());
        assert_eq!(h.registry.bots(ROOM).len(), 1);

        let events = h.recorder.events.lock().unwrap();
        let Event::Leave(leave) = &events[1] else {
            panic!("expected leave event");
        };
        assert_eq!(leave.reason, DISENGAGED_REASON);
    }

    #[tokio::test]
    async fn test_failing_unit_does_not_block_other_bots() {
        let h = harness(
            Arc::new(PanickingGenerator),
            quiet_config(1.0),
            always_reacting(),
            vec![skeptic("Fragile"), skeptic("Steady")],
        );

        let handles = h
            .scheduler
            .fan_out(chunk("Why should we trust this?"), Arc::clone(&h.dispatcher))
            .unwrap();
        let results = futures::future::join_all(handles).await;

        assert_eq!(results.iter().filter(|result| result.is_err()).count(), 1);
        let reactions = h.recorder.reactions();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].bot_id, "Steady");
    }

    #[tokio::test]
    async fn test_debug_events_carry_decision_records() {
        let config = SchedulerConfig {
            debug_events: true,
            ..quiet_config(0.0)
        };
        let h = harness(
            Arc::new(FailingGenerator),
            config,
            always_reacting(),
            vec![supporter("Engaged Student")],
        );

        run_one(&h, "Thanks for coming!").await;
        assert_eq!(h.recorder.kinds(), vec![EventKind::Reaction, EventKind::ReactionDebug]);
    }

    #[tokio::test]
    async fn test_transcript_events_fan_out_through_dispatcher() {
        let h = harness(
            Arc::new(FailingGenerator),
            quiet_config(0.0),
            always_reacting(),
            vec![supporter("Engaged Student"), skeptic("Critical Thinker")],
        );
        h.dispatcher.subscribe(EventKind::Transcript, h.scheduler.clone());

        let report = h.dispatcher.publish(Event::Transcript(chunk("Revenue grew this quarter.")));
        assert_eq!(report.failed, 0);
        h.scheduler.wait_idle().await;

        assert_eq!(h.recorder.reactions().len(), 2);
    }

    #[tokio::test]
    async fn test_other_rooms_are_untouched() {
        let h = harness(
            Arc::new(FailingGenerator),
            quiet_config(0.0),
            always_reacting(),
            vec![supporter("Engaged Student")],
        );
        let mut other = chunk("Hello?");
        other.room_id = "room-2".to_string();

        let handles = h.scheduler.fan_out(other, Arc::clone(&h.dispatcher)).unwrap();
        assert!(handles.is_empty());
        assert!(h.recorder.kinds().is_empty());
    }

    #[test]
    fn test_fan_out_requires_runtime() {
        let h = harness(
            Arc::new(FailingGenerator),
            quiet_config(0.0),
            always_reacting(),
            vec![supporter("Engaged Student")],
        );
        let err = h.scheduler.fan_out(chunk("Hi."), Arc::clone(&h.dispatcher)).unwrap_err();
        assert!(err.to_string().contains("tokio runtime"));
    }
}

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::model::{Room, RoomSnapshot};
use crate::bot::Bot;
use crate::coach::Coach;
use crate::config::RoomConfig;
use crate::error::Result;
use crate::event::{Event, EventDispatcher, EventHandler};

/// Lazily-populated container of all rooms in the process.
///
/// `RoomRegistry` is responsible for:
/// - Creating rooms on first reference
/// - Maintaining each room's bot roster
/// - Keeping the bounded transcript history and windowed queries over it
/// - Holding the optional per-room coach
///
/// Rooms never share state. The registry lock is only held to look up or
/// insert a room handle; work on a room takes that room's own lock.
pub struct RoomRegistry {
    config: RoomConfig,
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the room if needed. Returns `true` when it was created.
    pub fn ensure_room(&self, room_id: &str) -> bool {
        {
            let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
            if rooms.contains_key(room_id) {
                return false;
            }
        }

        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        if rooms.contains_key(room_id) {
            return false;
        }
        rooms.insert(
            room_id.to_string(),
            Arc::new(Mutex::new(Room::new(room_id, self.config.history_capacity))),
        );
        tracing::info!(room_id, "Room created");
        true
    }

    fn room(&self, room_id: &str) -> Arc<Mutex<Room>> {
        self.ensure_room(room_id);
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        match rooms.get(room_id) {
            Some(room) => Arc::clone(room),
            // Rooms are never removed, so this arm is unreachable in practice.
            None => Arc::new(Mutex::new(Room::new(room_id, self.config.history_capacity))),
        }
    }

    fn with_room<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> R {
        let room = self.room(room_id);
        let mut guard = room.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Adds a bot to the roster.
    ///
    /// Returns `false` and leaves the roster unchanged when a bot with the
    /// same id is already in the room.
    pub fn add_bot(&self, room_id: &str, bot: Arc<Bot>) -> bool {
        self.with_room(room_id, |room| {
            if room.bots.contains_key(bot.id()) {
                return false;
            }
            room.bots.insert(bot.id().to_string(), bot);
            room.touch();
            true
        })
    }

    /// Removes a bot. Unknown ids are a no-op.
    pub fn remove_bot(&self, room_id: &str, bot_id: &str) -> Option<Arc<Bot>> {
        self.with_room(room_id, |room| {
            let removed = room.bots.remove(bot_id);
            if removed.is_some() {
                room.touch();
            }
            removed
        })
    }

    pub fn bot(&self, room_id: &str, bot_id: &str) -> Option<Arc<Bot>> {
        self.with_room(room_id, |room| room.bots.get(bot_id).cloned())
    }

    /// Whole roster, departed bots included, ordered by id.
    pub fn bots(&self, room_id: &str) -> Vec<Arc<Bot>> {
        self.with_room(room_id, |room| room.bots.values().cloned().collect())
    }

    /// Bots that still take part in reaction fan-out.
    pub fn present_bots(&self, room_id: &str) -> Vec<Arc<Bot>> {
        // Clone handles first; bot locks are never taken under the room lock.
        self.bots(room_id)
            .into_iter()
            .filter(|bot| bot.is_present())
            .collect()
    }

    pub fn append_transcript(&self, room_id: &str, text: &str) {
        self.append_transcript_at(room_id, text, Utc::now());
    }

    pub fn append_transcript_at(&self, room_id: &str, text: &str, at: DateTime<Utc>) {
        self.with_room(room_id, |room| room.push_transcript(text, at));
    }

    /// Transcript of the last `seconds` seconds, oldest fragment first.
    pub fn transcript_window(&self, room_id: &str, seconds: u64) -> String {
        self.transcript_window_at(room_id, seconds, Utc::now())
    }

    pub fn transcript_window_at(&self, room_id: &str, seconds: u64, now: DateTime<Utc>) -> String {
        let window = Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX).min(i64::MAX / 1000));
        self.with_room(room_id, |room| room.transcript_since(window, now))
    }

    /// Detached copy of the room for external consumers.
    pub fn snapshot(&self, room_id: &str) -> RoomSnapshot {
        let window = self.config.snapshot_window_secs;
        let transcript = self.transcript_window(room_id, window);
        let (id, created_at, updated_at, bots, history_len, has_coach) = self.with_room(room_id, |room| {
            (
                room.id.clone(),
                room.created_at,
                room.updated_at,
                room.bots.values().cloned().collect::<Vec<_>>(),
                room.history_len(),
                room.coach.is_some(),
            )
        });

        RoomSnapshot {
            id,
            created_at,
            updated_at,
            bots: bots.iter().map(|bot| bot.snapshot()).collect(),
            transcript,
            history_len,
            has_coach,
        }
    }

    /// Attaches a coach, replacing any previous one.
    pub fn attach_coach(&self, room_id: &str, coach: Arc<dyn Coach>) {
        self.with_room(room_id, |room| {
            room.coach = Some(coach);
            room.touch();
        });
    }

    pub fn coach(&self, room_id: &str) -> Option<Arc<dyn Coach>> {
        self.with_room(room_id, |room| room.coach.clone())
    }

    pub fn room_ids(&self) -> Vec<String> {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = rooms.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

/// Records flushed transcript into room history and feeds the room's coach.
impl EventHandler for RoomRegistry {
    fn name(&self) -> &str {
        "room_registry"
    }

    fn handle(&self, event: &Event, _dispatcher: &Arc<EventDispatcher>) -> Result<()> {
        if let Event::Transcript(chunk) = event {
            self.append_transcript(&chunk.room_id, &chunk.text);
            if let Some(coach) = self.coach(&chunk.room_id) {
                coach.accumulate(&chunk.text);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotState;
    use crate::coach::CoachFeedback;
    use crate::event::EventKind;
    use crate::persona::{Domain, Persona, Stance};
    use crate::transcript::{FlushMetadata, TranscriptChunk};
    use async_trait::async_trait;

    fn bot(id: &str) -> Arc<Bot> {
        Arc::new(Bot::with_id(
            id,
            Persona::new("Critical Thinker", Stance::Skeptical, Domain::Finance, 0.3, 0.6),
            BotState::default(),
        ))
    }

    #[derive(Default)]
    struct RecordingCoach {
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Coach for RecordingCoach {
        fn accumulate(&self, text: &str) {
            self.texts.lock().unwrap().push(text.to_string());
        }

        async fn generate_end_session_feedback(&self) -> Option<CoachFeedback> {
            None
        }
    }

    #[test]
    fn test_ensure_room_is_idempotent() {
        let registry = RoomRegistry::default();
        assert!(registry.ensure_room("r1"));
        assert!(!registry.ensure_room("r1"));
        assert_eq!(registry.room_ids(), vec!["r1".to_string()]);
    }

    #[test]
    fn test_roster_operations() {
        let registry = RoomRegistry::default();
        assert!(registry.add_bot("r1", bot("b1")));
        assert!(!registry.add_bot("r1", bot("b1")));
        assert!(registry.add_bot("r1", bot("b2")));
        assert_eq!(registry.bots("r1").len(), 2);

        assert!(registry.remove_bot("r1", "b1").is_some());
        assert!(registry.remove_bot("r1", "b1").is_none());
        assert!(registry.remove_bot("r1", "missing").is_none());
        assert!(registry.bot("r1", "b2").is_some());
    }

    #[test]
    fn test_present_bots_excludes_departed() {
        let registry = RoomRegistry::default();
        registry.add_bot("r1", bot("b1"));
        let departed = bot("b2");
        departed.with_state(|state| state.present = false);
        registry.add_bot("r1", departed);

        let present: Vec<String> = registry
            .present_bots("r1")
            .iter()
            .map(|b| b.id().to_string())
            .collect();
        assert_eq!(present, vec!["b1".to_string()]);
        assert_eq!(registry.snapshot("r1").bots.len(), 2);
    }

    #[test]
    fn test_transcript_window_is_per_room() {
        let registry = RoomRegistry::default();
        let now = Utc::now();
        registry.append_transcript_at("a", "alpha one", now - Duration::seconds(10));
        registry.append_transcript_at("b", "bravo only", now - Duration::seconds(5));
        registry.append_transcript_at("a", "alpha two", now);

        let window = registry.transcript_window_at("a", 60, now);
        assert_eq!(window, "alpha one alpha two");
        assert!(!window.contains("bravo"));
    }

    #[test]
    fn test_history_capacity_from_config() {
        let registry = RoomRegistry::new(RoomConfig {
            history_capacity: 2,
            snapshot_window_secs: 60,
        });
        for text in ["one", "two", "three"] {
            registry.append_transcript("r", text);
        }
        let snapshot = registry.snapshot("r");
        assert_eq!(snapshot.history_len, 2);
        assert_eq!(snapshot.transcript, "two three");
    }

    #[test]
    fn test_transcript_events_reach_history_and_coach() {
        let registry = Arc::new(RoomRegistry::default());
        let coach = Arc::new(RecordingCoach::default());
        registry.attach_coach("r1", coach.clone());

        let dispatcher = Arc::new(EventDispatcher::new());
        dispatcher.subscribe(EventKind::Transcript, registry.clone());
        dispatcher.publish(Event::Transcript(TranscriptChunk {
            room_id: "r1".to_string(),
            text: "Is this sustainable?".to_string(),
            metadata: FlushMetadata::analyze("Is this sustainable?"),
        }));

        assert_eq!(registry.transcript_window("r1", 60), "Is this sustainable?");
        assert_eq!(*coach.texts.lock().unwrap(), vec!["Is this sustainable?".to_string()]);
        assert!(registry.snapshot("r1").has_coach);
    }
}

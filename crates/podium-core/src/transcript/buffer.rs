use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::metadata::{FlushMetadata, TranscriptChunk};
use crate::config::{BufferConfig, FlushPolicy};

const TERMINATORS: [char; 3] = ['.', '!', '?'];

#[derive(Debug)]
struct BufferState {
    text: String,
    last_flush: Instant,
}

/// Result of appending one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushOutcome {
    pub flushed: bool,
    /// Flushed text; empty when nothing flushed.
    pub chunk: String,
    /// Present only when `flushed` is true.
    pub metadata: Option<FlushMetadata>,
}

impl FlushOutcome {
    fn pending() -> Self {
        Self {
            flushed: false,
            chunk: String::new(),
            metadata: None,
        }
    }

    fn flushed(chunk: String) -> Self {
        let metadata = FlushMetadata::analyze(&chunk);
        Self {
            flushed: true,
            chunk,
            metadata: Some(metadata),
        }
    }

    /// Converts a flush into a dispatchable chunk for `room_id`.
    pub fn into_chunk(self, room_id: &str) -> Option<TranscriptChunk> {
        let metadata = self.metadata?;
        self.flushed.then(|| TranscriptChunk {
            room_id: room_id.to_string(),
            text: self.chunk,
            metadata,
        })
    }
}

/// Per-room accumulator that turns a stream of fragments into flush units.
///
/// Rooms never share state. A room's clock starts at its first fragment.
#[derive(Debug)]
pub struct TranscriptBuffer {
    interval: Duration,
    policy: FlushPolicy,
    rooms: Mutex<HashMap<String, BufferState>>,
}

impl TranscriptBuffer {
    pub fn new(interval: Duration, policy: FlushPolicy) -> Self {
        Self {
            interval,
            policy,
            rooms: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &BufferConfig) -> Self {
        Self::new(config.flush_interval(), config.flush_policy)
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn append(&self, room_id: &str, fragment: &str) -> FlushOutcome {
        self.append_at(room_id, fragment, Instant::now())
    }

    /// Appends with an explicit monotonic timestamp.
    pub fn append_at(&self, room_id: &str, fragment: &str, now: Instant) -> FlushOutcome {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        let state = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| BufferState {
                text: String::new(),
                last_flush: now,
            });

        let fragment = fragment.trim();
        if fragment.is_empty() {
            return FlushOutcome::pending();
        }

        if state.text.is_empty() {
            state.text.push_str(fragment);
        } else {
            state.text.push(' ');
            state.text.push_str(fragment);
        }

        let ends_sentence = state.text.ends_with(TERMINATORS);
        let interval_elapsed = now.saturating_duration_since(state.last_flush) >= self.interval;
        let should_flush = match self.policy {
            FlushPolicy::TerminatorOrInterval => ends_sentence || interval_elapsed,
            FlushPolicy::IntervalOnly => interval_elapsed,
        };

        if !should_flush {
            return FlushOutcome::pending();
        }

        state.last_flush = now;
        FlushOutcome::flushed(std::mem::take(&mut state.text))
    }

    /// Flushes whatever is pending for the room, regardless of triggers.
    pub fn flush_now(&self, room_id: &str) -> FlushOutcome {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        match rooms.get_mut(room_id) {
            Some(state) if !state.text.is_empty() => {
                state.last_flush = Instant::now();
                FlushOutcome::flushed(std::mem::take(&mut state.text))
            }
            _ => FlushOutcome::pending(),
        }
    }

    /// Text accumulated since the last flush.
    pub fn pending_text(&self, room_id: &str) -> Option<String> {
        let rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        rooms.get(room_id).map(|state| state.text.clone())
    }
}

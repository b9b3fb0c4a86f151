use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use crate::bot::{Bot, BotSnapshot};
use crate::coach::Coach;

/// One flushed transcript fragment as kept in room history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// Isolation boundary: one roster, one transcript history, at most one coach.
pub struct Room {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub bots: BTreeMap<String, Arc<Bot>>,
    pub coach: Option<Arc<dyn Coach>>,
    history: VecDeque<TranscriptEntry>,
    history_capacity: usize,
}

impl Room {
    pub fn new(id: impl Into<String>, history_capacity: usize) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            bots: BTreeMap::new(),
            coach: None,
            history: VecDeque::new(),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Appends to history, evicting the oldest entries beyond capacity.
    pub fn push_transcript(&mut self, text: impl Into<String>, at: DateTime<Utc>) {
        while self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TranscriptEntry {
            at,
            text: text.into(),
        });
        self.updated_at = at;
    }

    /// Fragments newer than `now - window`, oldest first, joined by spaces.
    ///
    /// Only retained history is searched, so the result can be shorter than
    /// the window once eviction has started.
    pub fn transcript_since(&self, window: Duration, now: DateTime<Utc>) -> String {
        let cutoff = now.checked_sub_signed(window);
        self.history
            .iter()
            .filter(|entry| cutoff.is_none_or(|cutoff| entry.at >= cutoff))
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn history(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("bots", &self.bots.keys().collect::<Vec<_>>())
            .field("has_coach", &self.coach.is_some())
            .field("history_len", &self.history.len())
            .finish()
    }
}

/// Read-only projection of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub bots: Vec<BotSnapshot>,
    /// Transcript of the snapshot window (60 seconds by default).
    pub transcript: String,
    pub history_len: usize,
    pub has_coach: bool,
}

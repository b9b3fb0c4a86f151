//! Speaker coaching collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// End-of-session feedback for the speaker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachFeedback {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// Listens to a room's flushed transcript and produces feedback at session end.
#[async_trait]
pub trait Coach: Send + Sync {
    /// Called with every flushed chunk. Must not block.
    fn accumulate(&self, text: &str);

    /// `None` when there is nothing to say or generation failed.
    async fn generate_end_session_feedback(&self) -> Option<CoachFeedback>;
}

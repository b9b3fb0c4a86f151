//! Speaker coach backed by an OpenAI model.

use async_trait::async_trait;
use podium_core::coach::{Coach, CoachFeedback};
use podium_core::reaction::GenerationError;
use std::sync::{Mutex, PoisonError};

use crate::openai_client::OpenAiClient;

const COACH_SYSTEM_PROMPT: &str = r#"You are a public speaking coach. You will receive the full transcript of a talk.
Respond with a JSON object:
{"summary": "<two sentences>", "strengths": ["..."], "improvements": ["..."]}
Keep every list item under 15 words."#;

/// Parses the coach's JSON answer.
pub fn parse_coach_feedback(content: &str) -> Result<CoachFeedback, GenerationError> {
    let feedback: CoachFeedback = serde_json::from_str(content.trim())
        .map_err(|err| GenerationError::malformed(format!("invalid coach feedback: {err}")))?;
    if feedback.summary.trim().is_empty() {
        return Err(GenerationError::malformed("coach feedback has an empty summary"));
    }
    Ok(feedback)
}

/// Accumulates a room's transcript in memory and summarizes it on demand.
pub struct OpenAiCoach {
    client: OpenAiClient,
    transcript: Mutex<Vec<String>>,
}

impl OpenAiCoach {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn try_from_env() -> Result<Self, GenerationError> {
        Ok(Self::new(OpenAiClient::try_from_env()?))
    }

    /// Everything accumulated so far, in arrival order.
    pub fn transcript(&self) -> String {
        let transcript = self.transcript.lock().unwrap_or_else(PoisonError::into_inner);
        transcript.join(" ")
    }
}

#[async_trait]
impl Coach for OpenAiCoach {
    fn accumulate(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let mut transcript = self.transcript.lock().unwrap_or_else(PoisonError::into_inner);
        transcript.push(text.to_string());
    }

    async fn generate_end_session_feedback(&self) -> Option<CoachFeedback> {
        let transcript = self.transcript();
        if transcript.is_empty() {
            tracing::debug!("Coach has no transcript, skipping feedback");
            return None;
        }

        let result = match self.client.complete_json(COACH_SYSTEM_PROMPT, &transcript).await {
            Ok(content) => parse_coach_feedback(&content),
            Err(err) => Err(err),
        };

        match result {
            Ok(feedback) => Some(feedback),
            Err(err) => {
                tracing::warn!("Coach feedback generation failed: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feedback() {
        let feedback = parse_coach_feedback(
            r#"{"summary":"Clear talk.","strengths":["Pacing"],"improvements":["Fewer fillers"]}"#,
        )
        .unwrap();
        assert_eq!(feedback.summary, "Clear talk.");
        assert_eq!(feedback.strengths, vec!["Pacing".to_string()]);

        let minimal = parse_coach_feedback(r#"{"summary":"Ok."}"#).unwrap();
        assert!(minimal.improvements.is_empty());
    }

    #[test]
    fn test_parse_feedback_rejects_empty_summary() {
        assert!(parse_coach_feedback(r#"{"summary":"  "}"#).unwrap_err().is_malformed());
        assert!(parse_coach_feedback("[]").unwrap_err().is_malformed());
    }

    #[tokio::test]
    async fn test_accumulates_and_skips_empty_session() {
        let coach = OpenAiCoach::new(OpenAiClient::new("test-key", "gpt-4o-mini"));
        assert!(coach.generate_end_session_feedback().await.is_none());

        coach.accumulate("Welcome everyone.");
        coach.accumulate("   ");
        coach.accumulate("Revenue grew.");
        assert_eq!(coach.transcript(), "Welcome everyone. Revenue grew.");
    }
}

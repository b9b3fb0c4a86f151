//! Stage 2 reaction generators.

use async_trait::async_trait;
use podium_core::persona::Persona;
use podium_core::reaction::{GenerationError, Reaction, ReactionGenerator, parse_generated_reaction};

use crate::openai_client::OpenAiClient;

/// Builds the system prompt that puts the model in a persona's seat.
pub fn reaction_system_prompt(persona: &Persona) -> String {
    format!(
        r#"You are {name}, an audience member listening to a live talk.
Stance toward the speaker: {stance}. Domain: {domain}.
Snark: {snark:.1} (0 = none, 1 = very sarcastic). Politeness: {politeness:.1} (0 = blunt, 1 = very polite).

React to the speech with a JSON object containing:
- "emoji_unicode": emoji code (like "U+1F610")
- "micro_phrase": short phrase (max 3 words)
- "score_delta": number from -5 to +5

Example: {{"emoji_unicode": "U+1F610", "micro_phrase": "Interesting point", "score_delta": 1}}"#,
        name = persona.name,
        stance = persona.stance,
        domain = persona.domain,
        snark = persona.snark,
        politeness = persona.politeness,
    )
}

/// Asks an OpenAI model how a persona reacts to a transcript chunk.
#[derive(Debug, Clone)]
pub struct OpenAiReactionGenerator {
    client: OpenAiClient,
}

impl OpenAiReactionGenerator {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    pub fn try_from_env() -> Result<Self, GenerationError> {
        Ok(Self::new(OpenAiClient::try_from_env()?))
    }
}

#[async_trait]
impl ReactionGenerator for OpenAiReactionGenerator {
    async fn generate(&self, persona: &Persona, text: &str) -> Result<Reaction, GenerationError> {
        let content = self
            .client
            .complete_json(&reaction_system_prompt(persona), text)
            .await?;
        parse_generated_reaction(&content)
    }
}

/// Generator that never answers, for running without credentials.
///
/// Every escalation fails with `Unavailable`, so the scheduler always falls
/// back to the heuristic.
#[derive(Debug, Clone, Default)]
pub struct OfflineReactionGenerator;

#[async_trait]
impl ReactionGenerator for OfflineReactionGenerator {
    async fn generate(&self, _persona: &Persona, _text: &str) -> Result<Reaction, GenerationError> {
        Err(GenerationError::Unavailable("offline mode".to_string()))
    }
}

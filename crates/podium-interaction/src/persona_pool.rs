//! Topic-driven persona pool generation.

use async_trait::async_trait;
use podium_core::persona::{Persona, PersonaPoolGenerator, PersonaRecord};
use podium_core::reaction::GenerationError;
use serde_json::Value;

use crate::openai_client::OpenAiClient;

fn persona_pool_prompt(topic: &str, count: usize) -> String {
    format!(
        r#"Generate a list of exactly {count} diverse audience personas for a presentation on "{topic}".
Respond with a single JSON object of the form {{"personas": [...]}} containing exactly {count} objects.
Each object must have the following keys and adhere EXACTLY to the specified data types and allowed values:
- "name": string
- "stance": string (must be one of "supportive", "skeptical", or "curious")
- "domain": string (must be one of "tech", "design", or "finance")
- "snark": float (a JSON number between 0.0 and 1.0)
- "politeness": float (a JSON number between 0.0 and 1.0)"#
    )
}

/// Extracts personas from generator output.
///
/// Accepts a bare JSON array, or an object whose first array-valued field
/// holds the personas. Entries with unknown stance/domain values or the wrong
/// shape are skipped.
pub fn parse_persona_pool(content: &str) -> Result<Vec<Persona>, GenerationError> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|err| GenerationError::malformed(format!("invalid persona pool JSON: {err}")))?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, value)| match value {
                Value::Array(entries) => Some(entries),
                _ => None,
            })
            .ok_or_else(|| GenerationError::malformed("no persona list in response"))?,
        _ => return Err(GenerationError::malformed("persona pool is not a list")),
    };

    let personas: Vec<Persona> = entries
        .into_iter()
        .filter_map(|entry| {
            let record: PersonaRecord = match serde_json::from_value(entry) {
                Ok(record) => record,
                Err(err) => {
                    tracing::debug!("Skipping persona entry with bad shape: {}", err);
                    return None;
                }
            };
            match Persona::try_from(record) {
                Ok(persona) => Some(persona),
                Err(err) => {
                    tracing::debug!("Skipping persona entry: {}", err);
                    None
                }
            }
        })
        .collect();

    Ok(personas)
}

/// Persona pool generator backed by an OpenAI model.
#[derive(Debug, Clone)]
pub struct OpenAiPersonaPoolGenerator {
    client: OpenAiClient,
}

impl OpenAiPersonaPoolGenerator {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client: client.with_temperature(0.8),
        }
    }

    pub fn try_from_env() -> Result<Self, GenerationError> {
        Ok(Self::new(OpenAiClient::try_from_env()?))
    }
}

#[async_trait]
impl PersonaPoolGenerator for OpenAiPersonaPoolGenerator {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<Persona>, GenerationError> {
        let system = "You design realistic audiences for presentation rehearsals. Answer with JSON only.";
        let content = self
            .client
            .complete_json(system, &persona_pool_prompt(topic, count))
            .await?;
        parse_persona_pool(&content)
    }
}

/// Pool generator that never answers, so spawning uses the built-in pool.
#[derive(Debug, Clone, Default)]
pub struct OfflinePersonaPoolGenerator;

#[async_trait]
impl PersonaPoolGenerator for OfflinePersonaPoolGenerator {
    async fn generate(&self, _topic: &str, _count: usize) -> Result<Vec<Persona>, GenerationError> {
        Err(GenerationError::Unavailable("offline mode".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_core::persona::{Domain, Stance};

    #[test]
    fn test_parses_bare_array() {
        let personas = parse_persona_pool(
            r#"[{"name":"Ops Lead","stance":"skeptical","domain":"tech","snark":0.4,"politeness":0.5}]"#,
        )
        .unwrap();
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].stance, Stance::Skeptical);
        assert_eq!(personas[0].domain, Domain::Tech);
    }

    #[test]
    fn test_parses_wrapped_list_and_skips_invalid_entries() {
        let personas = parse_persona_pool(
            r#"{"personas": [
                {"name":"A","stance":"supportive","domain":"design","snark":0.1,"politeness":0.9},
                {"name":"B","stance":"angry","domain":"design","snark":0.1,"politeness":0.9},
                {"name":"C","stance":"curious","domain":"marketing","snark":0.1,"politeness":0.9},
                "not an object"
            ]}"#,
        )
        .unwrap();
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].name, "A");
    }

    #[test]
    fn test_rejects_responses_without_a_list() {
        assert!(parse_persona_pool(r#"{"note":"sorry"}"#).unwrap_err().is_malformed());
        assert!(parse_persona_pool("nope").unwrap_err().is_malformed());
        assert!(parse_persona_pool("42").unwrap_err().is_malformed());
    }

    #[test]
    fn test_prompt_mentions_topic_and_count() {
        let prompt = persona_pool_prompt("Quarterly Results", 7);
        assert!(prompt.contains("exactly 7"));
        assert!(prompt.contains("\"Quarterly Results\""));
    }
}

use anyhow::{Context, Result};
use podium_application::BotSpawner;
use podium_core::persona::PersonaPoolGenerator;
use podium_interaction::{OfflinePersonaPoolGenerator, OpenAiPersonaPoolGenerator};
use std::sync::Arc;

pub async fn run(topic: &str, count: usize, offline: bool) -> Result<()> {
    let spawner = BotSpawner::new(persona_generator(offline));
    let pool = spawner.persona_pool(topic, count).await;
    let json = serde_json::to_string_pretty(&pool).context("Failed to serialize persona pool")?;
    println!("{json}");
    Ok(())
}

pub fn persona_generator(offline: bool) -> Arc<dyn PersonaPoolGenerator> {
    if offline {
        return Arc::new(OfflinePersonaPoolGenerator);
    }
    match OpenAiPersonaPoolGenerator::try_from_env() {
        Ok(generator) => Arc::new(generator),
        Err(err) => {
            tracing::warn!("Persona generation unavailable, using built-in pool: {}", err);
            Arc::new(OfflinePersonaPoolGenerator)
        }
    }
}

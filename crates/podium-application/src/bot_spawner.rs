//! Bot spawning from topic-driven persona pools.

use podium_core::bot::{Bot, BotSnapshot};
use podium_core::persona::{Persona, PersonaPoolGenerator, fallback_persona_pool};
use rand::seq::SliceRandom;
use std::sync::Arc;

use crate::live_audience::LiveAudience;

/// Creates bots for a room from a generated persona pool.
pub struct BotSpawner {
    generator: Arc<dyn PersonaPoolGenerator>,
}

impl BotSpawner {
    pub fn new(generator: Arc<dyn PersonaPoolGenerator>) -> Self {
        Self { generator }
    }

    /// Asks the generator for a pool, falling back to the built-in personas
    /// when it fails or returns nothing usable.
    pub async fn persona_pool(&self, topic: &str, count: usize) -> Vec<Persona> {
        match self.generator.generate(topic, count).await {
            Ok(pool) if !pool.is_empty() => pool,
            Ok(_) => {
                tracing::warn!(topic, "Persona pool generator returned no personas, using fallback pool");
                fallback_persona_pool()
            }
            Err(err) => {
                tracing::warn!(topic, "Persona pool generation failed, using fallback pool: {}", err);
                fallback_persona_pool()
            }
        }
    }

    /// Spawns `count` bots into `room_id`, each with a persona drawn at random
    /// from the pool. Every added bot is announced with a `join` event.
    pub async fn spawn(
        &self,
        audience: &LiveAudience,
        room_id: &str,
        topic: &str,
        count: usize,
    ) -> Vec<BotSnapshot> {
        if count == 0 {
            return Vec::new();
        }

        let pool = self.persona_pool(topic, count).await;
        let defaults = &audience.config().bot;

        let personas: Vec<Persona> = {
            let mut rng = rand::thread_rng();
            (0..count)
                .filter_map(|_| pool.choose(&mut rng).cloned())
                .collect()
        };

        let snapshots: Vec<BotSnapshot> = personas
            .into_iter()
            .map(|persona| Arc::new(Bot::new(persona, defaults)))
            .filter(|bot| audience.add_bot(room_id, Arc::clone(bot)))
            .map(|bot| bot.snapshot())
            .collect();

        tracing::info!(room_id, topic, spawned = snapshots.len(), "Spawned bots");
        snapshots
    }
}

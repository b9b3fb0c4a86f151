use async_trait::async_trait;

use super::model::Persona;
use crate::reaction::GenerationError;

/// Produces a pool of personas for a presentation topic.
///
/// Only bot spawning consumes this; the reaction pipeline never does.
#[async_trait]
pub trait PersonaPoolGenerator: Send + Sync {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<Persona>, GenerationError>;
}

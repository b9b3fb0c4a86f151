//! OpenAI-backed implementations of the engine's collaborator traits.

pub mod coach;
pub mod openai_client;
pub mod persona_pool;
pub mod reaction_generator;

pub use coach::OpenAiCoach;
pub use openai_client::OpenAiClient;
pub use persona_pool::{OfflinePersonaPoolGenerator, OpenAiPersonaPoolGenerator};
pub use reaction_generator::{OfflineReactionGenerator, OpenAiReactionGenerator};

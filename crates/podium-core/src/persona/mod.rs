//! Persona domain module.
//!
//! A persona is the immutable profile a bot is created with: who it is, which
//! stance it takes toward the speaker and which domain it listens from.
//!
//! # Module Structure
//!
//! - `model`: Core persona domain models (`Persona`, `Stance`, `Domain`, `PersonaRecord`)
//! - `preset`: Built-in fallback persona pool
//! - `generator`: Collaborator trait for generating persona pools

mod generator;
mod model;
mod preset;

// Re-export public API
pub use generator::PersonaPoolGenerator;
pub use model::{Domain, Persona, PersonaRecord, Stance};
pub use preset::fallback_persona_pool;

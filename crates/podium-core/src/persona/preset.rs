//! Built-in persona pool used when generation is unavailable.

use super::model::{Domain, Persona, Stance};

/// Returns the fallback persona pool.
///
/// Used by bot spawning whenever the persona pool generator fails or returns
/// nothing usable.
pub fn fallback_persona_pool() -> Vec<Persona> {
    vec![
        Persona::new("Engaged Student", Stance::Supportive, Domain::Tech, 0.1, 0.8),
        Persona::new("Critical Thinker", Stance::Skeptical, Domain::Finance, 0.3, 0.6),
        Persona::new("Curious Designer", Stance::Curious, Domain::Design, 0.1, 0.9),
    ]
}

//! Persona domain model.
//!
//! Represents the audience member profile behind each bot. Personas are
//! immutable once a bot has been created from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PodiumError;

/// Attitude a bot takes toward the speaker.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Supportive,
    Skeptical,
    Curious,
}

impl Stance {
    pub const ALL: [Stance; 3] = [Stance::Supportive, Stance::Skeptical, Stance::Curious];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Supportive => "supportive",
            Stance::Skeptical => "skeptical",
            Stance::Curious => "curious",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stance {
    type Err = PodiumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "supportive" => Ok(Stance::Supportive),
            "skeptical" => Ok(Stance::Skeptical),
            "curious" => Ok(Stance::Curious),
            other => Err(PodiumError::not_found("Stance", other)),
        }
    }
}

/// Professional lens a bot listens through.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Tech,
    Design,
    Finance,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Tech, Domain::Design, Domain::Finance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Tech => "tech",
            Domain::Design => "design",
            Domain::Finance => "finance",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = PodiumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "tech" => Ok(Domain::Tech),
            "design" => Ok(Domain::Design),
            "finance" => Ok(Domain::Finance),
            other => Err(PodiumError::not_found("Domain", other)),
        }
    }
}

/// An audience member profile.
///
/// `snark` and `politeness` are clamped into `[0, 1]` on construction.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Persona {
    /// Display name of the persona
    pub name: String,
    /// Attitude toward the speaker
    pub stance: Stance,
    /// Professional lens
    pub domain: Domain,
    /// How sarcastic the persona is, 0..=1
    pub snark: f64,
    /// How polite the persona is, 0..=1
    pub politeness: f64,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        stance: Stance,
        domain: Domain,
        snark: f64,
        politeness: f64,
    ) -> Self {
        Self {
            name: name.into(),
            stance,
            domain,
            snark: clamp_unit(snark),
            politeness: clamp_unit(politeness),
        }
    }
}

/// Loosely-typed persona as produced by a persona pool generator.
///
/// Generators return free-form JSON; records are validated into [`Persona`]
/// with `TryFrom`, and invalid ones are dropped by the caller.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PersonaRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stance: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub snark: f64,
    #[serde(default)]
    pub politeness: f64,
}

impl TryFrom<PersonaRecord> for Persona {
    type Error = PodiumError;

    fn try_from(record: PersonaRecord) -> Result<Self, Self::Error> {
        let stance = record.stance.parse::<Stance>()?;
        let domain = record.domain.parse::<Domain>()?;
        let name = if record.name.trim().is_empty() {
            format!("{} {}", stance, domain)
        } else {
            record.name.trim().to_string()
        };
        Ok(Persona::new(name, stance, domain, record.snark, record.politeness))
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stance_round_trips_through_strings() {
        for stance in Stance::ALL {
            assert_eq!(stance.as_str().parse::<Stance>().unwrap(), stance);
        }
        assert!("neutral".parse::<Stance>().is_err());
    }

    #[test]
    fn test_persona_clamps_traits() {
        let persona = Persona::new("Loud", Stance::Skeptical, Domain::Tech, 1.7, -0.2);
        assert_eq!(persona.snark, 1.0);
        assert_eq!(persona.politeness, 0.0);
    }

    #[test]
    fn test_record_conversion_rejects_unknown_domain() {
        let record = PersonaRecord {
            name: "Marketer".to_string(),
            stance: "supportive".to_string(),
            domain: "marketing".to_string(),
            snark: 0.2,
            politeness: 0.6,
        };
        let err = Persona::try_from(record).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_record_conversion_normalises_case_and_name() {
        let record = PersonaRecord {
            name: "  ".to_string(),
            stance: "Skeptical".to_string(),
            domain: "FINANCE".to_string(),
            snark: 0.3,
            politeness: 0.6,
        };
        let persona = Persona::try_from(record).unwrap();
        assert_eq!(persona.stance, Stance::Skeptical);
        assert_eq!(persona.domain, Domain::Finance);
        assert_eq!(persona.name, "skeptical finance");
    }

    #[test]
    fn test_persona_serializes_lowercase_enums() {
        let persona = Persona::new("Critical Thinker", Stance::Skeptical, Domain::Finance, 0.3, 0.6);
        let json = serde_json::to_value(&persona).unwrap();
        assert_eq!(json["stance"], "skeptical");
        assert_eq!(json["domain"], "finance");
    }
}

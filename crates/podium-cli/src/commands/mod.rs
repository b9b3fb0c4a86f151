pub mod config;
pub mod personas;
pub mod simulate;

pub const DEFAULT_TOPIC: &str = "Quarterly Results";

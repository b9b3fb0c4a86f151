use anyhow::{Context, Result};
use podium_infrastructure::ConfigService;
use std::path::PathBuf;

pub fn show(config_path: Option<PathBuf>) -> Result<()> {
    let service = ConfigService::new(config_path);
    let config = service
        .get_config()
        .context("Failed to load engine configuration")?;

    match service.config_path() {
        Some(path) if path.exists() => println!("# Loaded from {}", path.display()),
        Some(path) => println!("# {} not found, showing defaults", path.display()),
        None => println!("# No configuration directory, showing defaults"),
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}

use crate::config::{EvalmapConfig, CONFIG_FILE_NAME};
use anyhow::{Context, Result};
use std::path::Path;

const HEADER: &str = "# evalmap configuration\n\
# automated_weight + human_weight must sum to 1.0\n\
# agreement bonus: max_bonus * max(0, 1 - |automated - rating| / tolerance)\n\n";

/// Default configuration file contents
pub fn default_config_contents() -> Result<String> {
    let body = EvalmapConfig::default()
        .to_toml()
        .context("Failed to serialize default configuration")?;
    Ok(format!("{HEADER}{body}"))
}

/// Write the default configuration into `dir`.
pub fn init_config_in(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    std::fs::write(&config_path, default_config_contents()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(())
}

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)
}

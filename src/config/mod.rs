mod types;

pub use types::*;

use anyhow::{Context, Result};
use ffscribe_av::FormatRegistry;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./ffscribe.toml", "~/.config/ffscribe/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Build a registry holding the built-in profiles plus every configured one
pub fn build_registry(config: &Config) -> Result<FormatRegistry> {
    let registry = FormatRegistry::new();

    for (name, flags) in &config.profiles {
        let value = serde_json::to_value(flags)
            .with_context(|| format!("Profile '{}' cannot be converted", name))?;
        registry
            .register_custom_value(name, &value)
            .with_context(|| format!("Invalid profile '{}'", name))?;
    }

    Ok(registry)
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    build_registry(config)?;

    for path in [&config.tools.ffmpeg, &config.tools.ffprobe]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            tracing::warn!("Configured tool does not exist: {:?}", path);
        }
    }

    Ok(())
}

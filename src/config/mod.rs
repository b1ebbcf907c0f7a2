//! Configuration loading and validation.
//!
//! Configuration is read once at startup from a TOML file and is immutable
//! for the lifetime of the process. Unknown keys and an explicitly empty
//! model list are rejected here, never at request time.

mod types;

use std::path::Path;

pub use types::{Config, ProxyConfig, RouteConfig, DEFAULT_TARGET_MODEL};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("[route].models was given but contains no entries")]
    EmptyModelList,
}

/// Load configuration from a TOML file and validate it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    parse_config(&raw)
}

/// Parse and validate a TOML configuration string.
pub fn parse_config(raw: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if matches!(config.route.models.as_deref(), Some([])) {
        return Err(ConfigError::EmptyModelList);
    }
    Ok(())
}

impl RouteConfig {
    /// The effective target model list: the configured entries, or the
    /// built-in default when the key was never given.
    pub fn target_models(&self) -> Vec<String> {
        match &self.models {
            Some(models) if !models.is_empty() => models.clone(),
            _ => vec![DEFAULT_TARGET_MODEL.to_string()],
        }
    }
}

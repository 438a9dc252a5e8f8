//! Configuration parsing and validation for geowatch
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Monitored entity list and polling cadence
//! - Position source and notifier settings
//! - Command-line/environment overrides applied before validation
//! - Validation with clear error messages

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Values supplied outside the config file (CLI flags, environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replaces `[source].base_url`
    pub base_url: Option<String>,

    /// Replaces `[monitor].run_duration_seconds`
    pub run_duration_seconds: Option<u64>,

    /// Clears any configured run duration
    pub run_forever: bool,
}

impl ConfigOverrides {
    fn apply(&self, raw: &mut RawConfig) {
        if let Some(url) = &self.base_url {
            raw.source.base_url = Some(url.clone());
        }
        if let Some(secs) = self.run_duration_seconds {
            raw.monitor.run_duration_seconds = Some(secs);
        }
        if self.run_forever {
            raw.monitor.run_duration_seconds = None;
        }
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<MonitorConfig> {
    load_config_with(path, &ConfigOverrides::default())
}

/// Load configuration from a TOML file, apply overrides, then validate
pub fn load_config_with(
    path: impl AsRef<Path>,
    overrides: &ConfigOverrides,
) -> ConfigResult<MonitorConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading configuration");
    let content = std::fs::read_to_string(path)?;
    parse_config_with(&content, overrides)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<MonitorConfig> {
    parse_config_with(content, &ConfigOverrides::default())
}

/// Parse configuration from a TOML string, apply overrides, then validate
pub fn parse_config_with(content: &str, overrides: &ConfigOverrides) -> ConfigResult<MonitorConfig> {
    let mut raw: RawConfig = toml::from_str(content)?;

    // Check version
    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    overrides.apply(&mut raw);

    // Validate
    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(MonitorConfig::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

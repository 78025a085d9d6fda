//! Export configuration and its TOML loading.
//!
//! Configuration is looked up in this order:
//! 1. An explicit path, if given
//! 2. `erddl/config.toml` in the working directory
//! 3. `config.toml` in the platform configuration directory
//! 4. Built-in defaults

use std::fs;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;

use crate::adapter::SlotLayout;
use crate::error::{ConfigError, Error};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Connection slot layout of table shapes.
    pub layout: SlotLayout,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// `strftime` format of the header timestamp.
    pub timestamp_format: String,
    /// Emit a `-- Generated from <file>` header line.
    pub include_source: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            include_source: true,
        }
    }
}

impl ExportConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.slots_per_field == 0 {
            return Err(ConfigError::Validation(
                "layout.slots_per_field must be at least 1".into(),
            ));
        }
        if StrftimeItems::new(&self.output.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Validation(format!(
                "invalid timestamp format `{}`",
                self.output.timestamp_format
            )));
        }
        Ok(())
    }
}

/// Find and load the configuration.
///
/// # Errors
///
/// Returns error if an explicit path is given but missing, or if a found
/// file cannot be read, parsed or validated.
pub fn load_config(explicit_path: Option<&Path>) -> Result<ExportConfig, Error> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("erddl/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "erddl", "erddl") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(&system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(ExportConfig::default())
}

fn load_config_file(path: &Path) -> Result<ExportConfig, Error> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    let content = fs::read_to_string(path)?;
    Ok(ExportConfig::from_toml(&content)?)
}

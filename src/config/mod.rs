//! Application Configuration
//! Optional TOML file tuning the preview layout.
//!
//! ```toml
//! [layout]
//! direction = "LR"
//! nodesep = 30.0
//! ranksep = 60.0
//! margin = 20.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DiagramError;
use crate::layout::LayoutConfig;


/// Looked up in the working directory when no explicit path is given
pub const LOCAL_CONFIG: &str = "fsdedit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub layout: LayoutConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for DiagramError {
    fn from(err: ConfigError) -> Self {
        DiagramError::Config(err.to_string())
    }
}

impl AppConfig {
    /// Parse and validate configuration text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        for (name, value) in [
            ("nodesep", layout.nodesep),
            ("ranksep", layout.ranksep),
            ("margin", layout.margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "layout.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Find and load the configuration.
///
/// Search order: the explicit path (which must exist), then `fsdedit.toml`
/// in the working directory, then built-in defaults.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, DiagramError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());
        return load_config_file(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        info!("Loading configuration from {}", local.display());
        return load_config_file(local);
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: &Path) -> Result<AppConfig, DiagramError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    let content = fs::read_to_string(path)?;
    Ok(AppConfig::from_toml(&content)?)
}

// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::model::{ConfigDefaults, ConfigFile, RawConfigFile};
use crate::errors::{DevloopError, Result};

/// Supported on-disk config formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.json`, `.yaml` / `.yml` or `.toml`; anything else is rejected.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(DevloopError::UnsupportedConfigFormat(path.to_path_buf())),
        }
    }
}

/// Deserialize config text in the given format. No defaults, no validation.
pub fn parse_config_str(contents: &str, format: ConfigFormat) -> Result<RawConfigFile> {
    let raw = match format {
        ConfigFormat::Json => serde_json::from_str(contents)?,
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Toml => toml::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs deserialization; it does **not** apply defaults or
/// perform semantic validation. Use [`load_config`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;
    let raw = parse_config_str(&contents, format)?;
    info!(path = %path.display(), ?format, "loaded config file");
    Ok(raw)
}

/// Produce the validated configuration for this process.
///
/// - Without a path, the configuration is built from `defaults` alone.
/// - With a path, the file is loaded and its fields override `defaults`.
///
/// Any error here is fatal: the caller should abort before watching starts.
pub fn load_config(path: Option<&Path>, defaults: &ConfigDefaults) -> Result<ConfigFile> {
    let raw = match path {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    ConfigFile::try_from(raw.merge_over(defaults))
}

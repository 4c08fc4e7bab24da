// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported config file format: {0:?} (expected .json, .yaml, .yml or .toml)")]
    UnsupportedConfigFormat(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to register watch on {path:?}: {reason}")]
    WatchRegistration { path: PathBuf, reason: String },

    #[error("Notify error: {0}")]
    NotifyError(#[from] notify::Error),

    #[error("Watch source failed: {0}")]
    WatchSource(String),

    #[error("Live reload error: {0}")]
    LiveReload(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DevloopError>;

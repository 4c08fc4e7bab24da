// src/config/mod.rs

//! Configuration loading and validation for devloop.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a JSON / YAML / TOML file from disk (`loader.rs`).
//! - Parse duration strings (`duration.rs`).
//! - Validate the merged result into an immutable `ConfigFile` (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_config, load_from_path, parse_config_str, ConfigFormat};
pub use model::{CommandConfig, ConfigDefaults, ConfigFile, RawConfigFile, RuleConfig};

// src/config/validate.rs

use std::path::PathBuf;

use tracing::warn;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigDefaults, ConfigFile, RawConfigFile, RuleConfig};
use crate::errors::{DevloopError, Result};
use crate::watch::patterns::Pattern;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DevloopError;

    /// Validate a raw config. Unset fields fall back to
    /// `ConfigDefaults::default()`; callers with CLI-derived defaults merge
    /// them first via `RawConfigFile::merge_over`.
    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let raw = raw.merge_over(&ConfigDefaults::default());

        let watch_dirs = validate_watch_dirs(raw.watch_dirs.unwrap_or_default())?;
        let ignore_dirs: Vec<String> = raw
            .ignore_dirs
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();

        let debounce_str = raw.debounce_time.unwrap_or_default();
        let debounce = parse_duration(&debounce_str).map_err(|e| {
            DevloopError::ConfigError(format!("invalid debounce_time '{debounce_str}': {e}"))
        })?;

        let command_timeout = match raw.command_timeout {
            Some(s) => {
                let d = parse_duration(&s).map_err(|e| {
                    DevloopError::ConfigError(format!("invalid command_timeout '{s}': {e}"))
                })?;
                if d.is_zero() {
                    return Err(DevloopError::ConfigError(
                        "command_timeout must be greater than zero".to_string(),
                    ));
                }
                Some(d)
            }
            None => None,
        };

        let live_reload = raw.live_reload.unwrap_or(false);
        let live_reload_port = raw.live_reload_port.unwrap_or_default();
        if live_reload && live_reload_port == 0 {
            return Err(DevloopError::ConfigError(
                "live_reload_port must be between 1 and 65535".to_string(),
            ));
        }

        let rules = raw.rules.unwrap_or_default();
        validate_rules(&rules)?;
        if rules.is_empty() && !live_reload {
            return Err(DevloopError::ConfigError(
                "nothing to do: no rules configured (pass --cmd, add `rules` to the config file, or enable live_reload)"
                    .to_string(),
            ));
        }

        Ok(ConfigFile {
            watch_dirs,
            ignore_dirs,
            ignore_match: raw.ignore_match.unwrap_or_default(),
            rules,
            debounce,
            command_timeout,
            live_reload,
            live_reload_port,
        })
    }
}

fn validate_watch_dirs(dirs: Vec<String>) -> Result<Vec<PathBuf>> {
    if dirs.is_empty() {
        return Err(DevloopError::ConfigError(
            "watch_dirs must contain at least one directory".to_string(),
        ));
    }
    dirs.into_iter()
        .map(|d| {
            if d.trim().is_empty() {
                Err(DevloopError::ConfigError(
                    "watch_dirs contains an empty entry".to_string(),
                ))
            } else {
                Ok(PathBuf::from(d))
            }
        })
        .collect()
}

fn validate_rules(rules: &[RuleConfig]) -> Result<()> {
    for (idx, rule) in rules.iter().enumerate() {
        for pattern in &rule.patterns {
            Pattern::parse(pattern)?;
        }
        for command in &rule.commands {
            if command.cmd.trim().is_empty() {
                return Err(DevloopError::ConfigError(format!(
                    "rule #{idx} has a command with an empty `cmd`"
                )));
            }
        }

        if rule.patterns.is_empty() {
            warn!(rule = idx, "rule has no patterns and will never match");
        }
        if rule.commands.is_empty() {
            warn!(rule = idx, "rule has no commands; matching changes do nothing");
        }
    }
    Ok(())
}

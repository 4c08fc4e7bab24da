// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::IgnoreMatch;

pub const DEFAULT_DEBOUNCE: &str = "500ms";
pub const DEFAULT_LIVE_RELOAD_PORT: u16 = 35729;

/// Values used for every field a config file leaves out.
///
/// Normally derived from the CLI flags (`CliArgs::config_defaults`). When
/// `command` is set and the file has no `rules`, one rule is synthesized:
/// the `extensions` list as a single extension-shorthand pattern, bound to
/// `command` as a parallel restart command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDefaults {
    pub watch_dirs: Vec<String>,
    pub ignore_dirs: Vec<String>,
    pub extensions: Vec<String>,
    pub command: Option<String>,
    pub debounce_time: String,
    pub live_reload: bool,
    pub live_reload_port: u16,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            watch_dirs: vec![".".to_string()],
            ignore_dirs: vec!["node_modules".to_string(), ".git".to_string()],
            extensions: ["go", "js", "css", "html"].iter().map(|s| s.to_string()).collect(),
            command: None,
            debounce_time: DEFAULT_DEBOUNCE.to_string(),
            live_reload: false,
            live_reload_port: DEFAULT_LIVE_RELOAD_PORT,
        }
    }
}

impl ConfigDefaults {
    /// The rule list implied by `--ext` + `--cmd`, if a command was given.
    pub fn default_rules(&self) -> Vec<RuleConfig> {
        match &self.command {
            Some(cmd) => {
                let patterns = if self.extensions.is_empty() {
                    Vec::new()
                } else {
                    vec![self.extensions.join(",")]
                };
                vec![RuleConfig {
                    patterns,
                    commands: vec![CommandConfig {
                        cmd: cmd.clone(),
                        parallel: true,
                        restart: true,
                    }],
                }]
            }
            None => Vec::new(),
        }
    }
}

/// Configuration as read from a JSON, YAML or TOML file.
///
/// Every field is optional; missing ones are filled from [`ConfigDefaults`]
/// by [`RawConfigFile::merge_over`].
///
/// ```yaml
/// watch_dirs: ["."]
/// ignore_dirs: ["bin", ".git"]
/// debounce_time: "500ms"
/// rules:
///   - patterns: ["**/*.go"]
///     commands:
///       - cmd: "go build ./..."
///       - cmd: "go test ./..."
/// live_reload: true
/// live_reload_port: 35729
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch_dirs: Option<Vec<String>>,

    #[serde(default)]
    pub ignore_dirs: Option<Vec<String>>,

    /// `"segment"` (default) or `"substring"`.
    #[serde(default)]
    pub ignore_match: Option<IgnoreMatch>,

    #[serde(default)]
    pub rules: Option<Vec<RuleConfig>>,

    #[serde(default)]
    pub debounce_time: Option<String>,

    /// Upper bound for a single command; unset means wait forever.
    #[serde(default)]
    pub command_timeout: Option<String>,

    #[serde(default)]
    pub live_reload: Option<bool>,

    #[serde(default)]
    pub live_reload_port: Option<u16>,
}

impl RawConfigFile {
    /// Fill every unset field from `defaults`. Fields present in `self` win.
    pub fn merge_over(self, defaults: &ConfigDefaults) -> Self {
        Self {
            watch_dirs: self.watch_dirs.or_else(|| Some(defaults.watch_dirs.clone())),
            ignore_dirs: self.ignore_dirs.or_else(|| Some(defaults.ignore_dirs.clone())),
            ignore_match: self.ignore_match.or(Some(IgnoreMatch::default())),
            rules: self.rules.or_else(|| Some(defaults.default_rules())),
            debounce_time: self
                .debounce_time
                .or_else(|| Some(defaults.debounce_time.clone())),
            command_timeout: self.command_timeout,
            live_reload: self.live_reload.or(Some(defaults.live_reload)),
            live_reload_port: self.live_reload_port.or(Some(defaults.live_reload_port)),
        }
    }
}

/// One rule: patterns bound to an ordered command sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Globs (`**/*.go`) or extension lists (`go,js`). Empty = never matches.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Commands run in declared order. Empty = no-op.
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

/// One command inside a rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    /// Shell command line, handed verbatim to `sh -c`.
    pub cmd: String,

    /// `true`: launch and move on; failures are only logged.
    /// `false`: wait for exit; a failure stops the rest of the rule.
    #[serde(default)]
    pub parallel: bool,

    /// Kill the still-running previous invocation before starting again.
    #[serde(default)]
    pub restart: bool,
}

impl CommandConfig {
    pub fn serial(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            parallel: false,
            restart: false,
        }
    }

    pub fn parallel(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            parallel: true,
            restart: false,
        }
    }
}

/// Validated, immutable configuration.
///
/// Built only through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub(crate) watch_dirs: Vec<PathBuf>,
    pub(crate) ignore_dirs: Vec<String>,
    pub(crate) ignore_match: IgnoreMatch,
    pub(crate) rules: Vec<RuleConfig>,
    pub(crate) debounce: Duration,
    pub(crate) command_timeout: Option<Duration>,
    pub(crate) live_reload: bool,
    pub(crate) live_reload_port: u16,
}

impl ConfigFile {
    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    pub fn ignore_dirs(&self) -> &[String] {
        &self.ignore_dirs
    }

    pub fn ignore_match(&self) -> IgnoreMatch {
        self.ignore_match
    }

    pub fn rules(&self) -> &[RuleConfig] {
        &self.rules
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    pub fn live_reload(&self) -> bool {
        self.live_reload
    }

    pub fn live_reload_port(&self) -> u16 {
        self.live_reload_port
    }
}

#![allow(dead_code)]

use devloop::config::{CommandConfig, ConfigFile, RawConfigFile, RuleConfig};
use devloop::types::IgnoreMatch;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from an empty `RawConfigFile`, so anything left unset gets the
/// regular defaults during validation.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_watch_dir(mut self, dir: &str) -> Self {
        self.config
            .watch_dirs
            .get_or_insert_with(Vec::new)
            .push(dir.to_string());
        self
    }

    pub fn with_ignore_dir(mut self, dir: &str) -> Self {
        self.config
            .ignore_dirs
            .get_or_insert_with(Vec::new)
            .push(dir.to_string());
        self
    }

    pub fn with_ignore_match(mut self, mode: IgnoreMatch) -> Self {
        self.config.ignore_match = Some(mode);
        self
    }

    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.config.rules.get_or_insert_with(Vec::new).push(rule);
        self
    }

    pub fn with_debounce(mut self, value: &str) -> Self {
        self.config.debounce_time = Some(value.to_string());
        self
    }

    pub fn with_command_timeout(mut self, value: &str) -> Self {
        self.config.command_timeout = Some(value.to_string());
        self
    }

    pub fn with_live_reload(mut self, port: u16) -> Self {
        self.config.live_reload = Some(true);
        self.config.live_reload_port = Some(port);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RuleConfig`.
pub struct RuleBuilder {
    rule: RuleConfig,
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self {
            rule: RuleConfig::default(),
        }
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.rule.patterns.push(pattern.to_string());
        self
    }

    /// Serial command: awaited, a failure stops the rest of the rule.
    pub fn serial(mut self, cmd: &str) -> Self {
        self.rule.commands.push(CommandConfig::serial(cmd));
        self
    }

    /// Parallel command: launched and not awaited.
    pub fn parallel(mut self, cmd: &str) -> Self {
        self.rule.commands.push(CommandConfig::parallel(cmd));
        self
    }

    pub fn command(mut self, command: CommandConfig) -> Self {
        self.rule.commands.push(command);
        self
    }

    pub fn build(self) -> RuleConfig {
        self.rule
    }
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flags double as configuration defaults: a config file passed with
//! `--config` overrides any field it sets, everything else comes from here.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ConfigDefaults;

/// Command-line arguments for `devloop`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "devloop",
    version,
    about = "Run commands when watched files change, with optional browser live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (JSON, YAML or TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to watch recursively. May be given multiple times.
    #[arg(long = "watch", value_name = "DIR", default_value = ".")]
    pub watch_dirs: Vec<String>,

    /// Comma-separated list of directory names to ignore.
    #[arg(long, value_name = "LIST", default_value = "node_modules,.git")]
    pub ignore: String,

    /// Comma-separated list of file extensions that trigger `--cmd`.
    #[arg(long, value_name = "LIST", default_value = "go,js,css,html")]
    pub ext: String,

    /// Command to (re)start when a file with one of `--ext` changes.
    ///
    /// Ignored when the config file defines its own `rules`.
    #[arg(long, value_name = "CMD")]
    pub cmd: Option<String>,

    /// Minimum time between two handled changes (e.g. "500ms", "1s").
    #[arg(long, value_name = "DURATION", default_value = "500ms")]
    pub debounce: String,

    /// Serve a WebSocket endpoint that tells browsers to reload on
    /// html/css/js changes.
    #[arg(long)]
    pub live_reload: bool,

    /// Port for the live reload server.
    #[arg(long, value_name = "PORT", default_value_t = 35729)]
    pub live_reload_port: u16,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVLOOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate the configuration, print it, but don't watch anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Configuration defaults derived from the flags.
    pub fn config_defaults(&self) -> ConfigDefaults {
        ConfigDefaults {
            watch_dirs: self.watch_dirs.clone(),
            ignore_dirs: split_list(&self.ignore),
            extensions: split_list(&self.ext),
            command: self.cmd.clone(),
            debounce_time: self.debounce.clone(),
            live_reload: self.live_reload,
            live_reload_port: self.live_reload_port,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// src/engine/mod.rs

//! Event pipeline for devloop.
//!
//! This module ties together:
//! - the debouncer (one global quiescence window)
//! - the compiled rule set and the dispatcher that runs matching commands
//! - the main runtime event loop that reacts to:
//!   - file changes from the watcher
//!   - watch-source failures
//!   - shutdown signals

use std::path::PathBuf;
use std::time::Instant;

pub mod debounce;
pub mod dispatcher;
pub mod rules;
pub mod runtime;

pub use debounce::Debouncer;
pub use dispatcher::{DispatchReport, Dispatcher, RuleRun};
pub use rules::{CompiledRule, RuleSet};
pub use runtime::{ChangeOutcome, Runtime};

/// One filesystem change, as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Absolute path reported by the OS.
    pub path: PathBuf,
    /// Path relative to the watch root, forward slashes. Used for matching.
    pub rel_path: String,
    /// When the event was received.
    pub at: Instant,
}

impl WatchEvent {
    /// Event for a root-relative path, stamped now.
    pub fn new(rel_path: impl Into<String>) -> Self {
        Self::at(rel_path, Instant::now())
    }

    pub fn at(rel_path: impl Into<String>, at: Instant) -> Self {
        let rel_path = rel_path.into();
        Self {
            path: PathBuf::from(&rel_path),
            rel_path,
            at,
        }
    }
}

/// Events flowing into the runtime from the watcher and signal handler.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A watched file was created, modified or removed.
    FileChanged(WatchEvent),
    /// The OS notification source failed; no further events can be trusted.
    WatchFailed(String),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

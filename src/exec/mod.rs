// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the commands defined in
//! rules through the host shell, using `tokio::process::Command`.
//!
//! - [`runner`] runs one shell command to completion, honouring restart
//!   cancellation and the optional timeout.
//! - [`backend`] provides the `CommandBackend` trait the dispatcher talks
//!   to, and `ShellRunner`, the production implementation that also owns
//!   the restart slots. Tests replace it with a fake backend.

use std::fmt;
use std::time::Duration;

pub mod backend;
pub mod runner;

pub use backend::{CommandBackend, CommandKey, ShellRunner};
pub use runner::{run_shell, KillAck};

/// Result of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failure(FailureReason),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}

/// Why a command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The process exited with a non-zero code.
    ExitCode(i32),
    /// The process was killed by a signal we did not send.
    Signal,
    /// The shell could not be started.
    Spawn(String),
    /// Waiting on the child failed.
    Wait(String),
    /// `command_timeout` elapsed and the process was killed.
    TimedOut(Duration),
    /// Killed because a newer invocation of the same restart command started.
    Terminated,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ExitCode(code) => write!(f, "exited with code {code}"),
            FailureReason::Signal => f.write_str("killed by signal"),
            FailureReason::Spawn(e) => write!(f, "failed to spawn: {e}"),
            FailureReason::Wait(e) => write!(f, "failed to wait for process: {e}"),
            FailureReason::TimedOut(d) => write!(f, "timed out after {d:?}"),
            FailureReason::Terminated => f.write_str("terminated for restart"),
        }
    }
}

// src/exec/backend.rs

//! Pluggable command backend abstraction.
//!
//! The dispatcher talks to a `CommandBackend` instead of spawning processes
//! itself. Production uses [`ShellRunner`]; tests provide a backend that
//! records invocations and returns scripted outcomes.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::debug;

use crate::config::CommandConfig;
use crate::exec::runner::{run_shell, KillAck};
use crate::exec::{CommandOutcome, FailureReason};

/// Identifies one command slot in the configuration: the command at index
/// `command` of the rule at index `rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandKey {
    pub rule: usize,
    pub command: usize,
}

/// Trait abstracting how a single configured command is executed.
///
/// The returned future resolves once the command has finished (or failed
/// to start). Whether the caller waits for it is the dispatcher's decision.
pub trait CommandBackend: Send + Sync + 'static {
    fn run_command<'a>(
        &'a self,
        key: CommandKey,
        command: &'a CommandConfig,
    ) -> Pin<Box<dyn Future<Output = CommandOutcome> + Send + 'a>>;
}

/// Real backend: runs commands through `sh -c`.
///
/// For `restart = true` commands it keeps at most one live invocation per
/// [`CommandKey`]. A new invocation signals the previous one and waits until
/// its process has been killed and reaped before spawning its own.
#[derive(Debug, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
    restart_slots: Mutex<HashMap<CommandKey, oneshot::Sender<KillAck>>>,
}

/// What a restart invocation holds on to while it starts.
struct RestartTicket {
    /// Fires when a newer invocation replaces this one.
    cancel: oneshot::Receiver<KillAck>,
    /// Resolves once the replaced invocation's process is gone.
    previous_stopped: Option<oneshot::Receiver<()>>,
}

impl ShellRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            restart_slots: Mutex::new(HashMap::new()),
        }
    }

    /// Run an ad-hoc command line, without restart tracking.
    pub async fn run(&self, cmd_line: &str) -> CommandOutcome {
        run_shell(cmd_line, None, self.timeout).await
    }

    /// Install a fresh cancel channel for `key` and signal the previous
    /// invocation, if one is still listening.
    fn replace_restart_slot(&self, key: CommandKey, cmd_line: &str) -> RestartTicket {
        let (cancel_tx, cancel) = oneshot::channel::<KillAck>();

        let previous = self
            .restart_slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, cancel_tx);

        let previous_stopped = previous.and_then(|previous| {
            let (ack_tx, ack_rx) = oneshot::channel::<()>();
            match previous.send(ack_tx) {
                Ok(()) => Some(ack_rx),
                Err(_) => {
                    debug!(
                        cmd = %cmd_line,
                        rule = key.rule,
                        "previous invocation already finished; nothing to terminate"
                    );
                    None
                }
            }
        });

        RestartTicket {
            cancel,
            previous_stopped,
        }
    }

    async fn run_restartable(&self, cmd_line: &str, ticket: RestartTicket) -> CommandOutcome {
        let RestartTicket {
            mut cancel,
            previous_stopped,
        } = ticket;

        if let Some(stopped) = previous_stopped {
            // An error means the previous invocation exited on its own.
            let _ = stopped.await;
            debug!(cmd = %cmd_line, "previous invocation stopped");
        }

        // Replaced while still waiting: never spawn.
        match cancel.try_recv() {
            Ok(ack) => {
                let _ = ack.send(());
                CommandOutcome::Failure(FailureReason::Terminated)
            }
            Err(TryRecvError::Empty) => run_shell(cmd_line, Some(cancel), self.timeout).await,
            Err(TryRecvError::Closed) => run_shell(cmd_line, None, self.timeout).await,
        }
    }
}

impl CommandBackend for ShellRunner {
    fn run_command<'a>(
        &'a self,
        key: CommandKey,
        command: &'a CommandConfig,
    ) -> Pin<Box<dyn Future<Output = CommandOutcome> + Send + 'a>> {
        if !command.restart {
            return Box::pin(run_shell(&command.cmd, None, self.timeout));
        }

        // Take the slot now, in call order, not when the future is first polled.
        let ticket = self.replace_restart_slot(key, &command.cmd);
        Box::pin(self.run_restartable(&command.cmd, ticket))
    }
}

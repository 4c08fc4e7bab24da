// src/exec/runner.rs

//! Single shell command runner.

use std::future::pending;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::exec::{CommandOutcome, FailureReason};

/// Handed to a running restart command by its replacement. Answered once
/// the old process has been killed and reaped.
pub type KillAck = oneshot::Sender<()>;

/// Run `cmd_line` through the host shell and wait for it.
///
/// - stdout/stderr and the environment are inherited; stdin is closed.
/// - If `cancel` fires, the child is killed and reaped, the received
///   [`KillAck`] is answered, and the outcome is `Failure(Terminated)`. A
///   cancel sender dropped without firing is ignored.
/// - If `timeout` elapses first, the child is killed and the outcome is
///   `Failure(TimedOut)`. Without a timeout we wait indefinitely.
pub async fn run_shell(
    cmd_line: &str,
    cancel: Option<oneshot::Receiver<KillAck>>,
    timeout: Option<Duration>,
) -> CommandOutcome {
    let mut cmd = shell_command(cmd_line);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(cmd = %cmd_line, error = %err, "failed to spawn command");
            return CommandOutcome::Failure(FailureReason::Spawn(err.to_string()));
        }
    };
    info!(cmd = %cmd_line, pid = ?child.id(), "started command");

    let cancelled = async move {
        match cancel {
            Some(rx) => match rx.await {
                Ok(ack) => ack,
                Err(_) => pending::<KillAck>().await,
            },
            None => pending::<KillAck>().await,
        }
    };

    let deadline = async move {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => pending::<()>().await,
        }
    };

    tokio::select! {
        status_res = child.wait() => match status_res {
            Ok(status) => outcome_from_status(cmd_line, status),
            Err(err) => {
                error!(cmd = %cmd_line, error = %err, "failed waiting for command");
                CommandOutcome::Failure(FailureReason::Wait(err.to_string()))
            }
        },

        ack = cancelled => {
            info!(cmd = %cmd_line, "newer invocation requested; killing previous process");
            kill_child(&mut child, cmd_line).await;
            // The restarting invocation may have given up waiting.
            let _ = ack.send(());
            CommandOutcome::Failure(FailureReason::Terminated)
        }

        _ = deadline => {
            let limit = timeout.unwrap_or_default();
            warn!(cmd = %cmd_line, ?limit, "command timed out; killing process");
            kill_child(&mut child, cmd_line).await;
            CommandOutcome::Failure(FailureReason::TimedOut(limit))
        }
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd_line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    }
}

fn outcome_from_status(cmd_line: &str, status: ExitStatus) -> CommandOutcome {
    debug!(cmd = %cmd_line, ?status, "command exited");
    if status.success() {
        CommandOutcome::Success
    } else {
        match status.code() {
            Some(code) => CommandOutcome::Failure(FailureReason::ExitCode(code)),
            None => CommandOutcome::Failure(FailureReason::Signal),
        }
    }
}

/// Kill and reap. Best effort: a failed kill is logged and otherwise ignored.
async fn kill_child(child: &mut Child, cmd_line: &str) {
    if let Err(err) = child.kill().await {
        warn!(cmd = %cmd_line, error = %err, "failed to kill child process");
    }
}

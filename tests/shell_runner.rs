// tests/shell_runner.rs

#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use devloop::config::CommandConfig;
use devloop::exec::{
    run_shell, CommandBackend, CommandKey, CommandOutcome, FailureReason, KillAck, ShellRunner,
};
use devloop_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const KEY: CommandKey = CommandKey { rule: 0, command: 0 };

#[tokio::test]
async fn exit_status_maps_to_outcome() {
    init_tracing();
    let runner = ShellRunner::new(None);

    assert_eq!(with_timeout(runner.run("true")).await, CommandOutcome::Success);
    assert_eq!(
        with_timeout(runner.run("exit 3")).await,
        CommandOutcome::Failure(FailureReason::ExitCode(3))
    );
}

#[tokio::test]
async fn shell_features_are_available() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out.txt");
    let cmd = format!("echo one > {p} && echo two >> {p}", p = out.display());

    let outcome = with_timeout(run_shell(&cmd, None, None)).await;

    assert!(outcome.is_success());
    assert_eq!(std::fs::read_to_string(&out)?, "one\ntwo\n");
    Ok(())
}

#[tokio::test]
async fn timeout_kills_the_process() {
    init_tracing();
    let limit = Duration::from_millis(200);
    let started = Instant::now();

    let outcome = with_timeout(run_shell("sleep 30", None, Some(limit))).await;

    assert_eq!(outcome, CommandOutcome::Failure(FailureReason::TimedOut(limit)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn cancel_terminates_the_process() {
    init_tracing();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let task = tokio::spawn(async move { run_shell("sleep 30", Some(cancel_rx), None).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let (ack_tx, ack_rx) = oneshot::channel();
    cancel_tx.send(ack_tx).expect("runner still waiting");

    // Answered only after the child has been killed and reaped.
    with_timeout(ack_rx).await.expect("kill acknowledged");
    let outcome = with_timeout(task).await.expect("task completed");
    assert_eq!(outcome, CommandOutcome::Failure(FailureReason::Terminated));
}

#[tokio::test]
async fn dropped_cancel_sender_is_not_a_cancel() {
    let (cancel_tx, cancel_rx) = oneshot::channel::<KillAck>();
    drop(cancel_tx);

    let outcome = with_timeout(run_shell("sleep 0.1", Some(cancel_rx), None)).await;
    assert_eq!(outcome, CommandOutcome::Success);
}

#[tokio::test]
async fn restart_command_replaces_previous_invocation() {
    init_tracing();
    let runner = Arc::new(ShellRunner::new(None));
    let server = CommandConfig {
        cmd: "sleep 30".to_string(),
        parallel: true,
        restart: true,
    };

    let first = {
        let runner = Arc::clone(&runner);
        let server = server.clone();
        tokio::spawn(async move { runner.run_command(KEY, &server).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let quick = CommandConfig {
        cmd: "true".to_string(),
        ..server
    };
    let second = with_timeout(runner.run_command(KEY, &quick)).await;
    assert_eq!(second, CommandOutcome::Success);

    let first = with_timeout(first).await.expect("task completed");
    assert_eq!(first, CommandOutcome::Failure(FailureReason::Terminated));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restart_never_overlaps_previous_process() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let pid_file = dir.path().join("pid");
    let log_file = dir.path().join("log");
    // `exec` keeps the shell's pid, so `$$` is the pid that gets killed.
    let server = CommandConfig {
        cmd: format!(
            "if [ -f {pid} ] && kill -0 $(cat {pid}) 2>/dev/null; \
             then echo overlap >> {log}; else echo clean >> {log}; fi; \
             echo $$ > {pid}; exec sleep 30",
            pid = pid_file.display(),
            log = log_file.display(),
        ),
        parallel: true,
        restart: true,
    };
    let runner = Arc::new(ShellRunner::new(None));

    const RUNS: usize = 8;
    let mut tasks = Vec::new();
    for _ in 0..RUNS {
        let runner = Arc::clone(&runner);
        let server = server.clone();
        tasks.push(tokio::spawn(async move { runner.run_command(KEY, &server).await }));
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    let log_complete = devloop_test_utils::wait_until(Duration::from_secs(5), || {
        std::fs::read_to_string(&log_file)
            .map(|log| log.lines().count() == RUNS)
            .unwrap_or(false)
    })
    .await;
    assert!(log_complete, "not every invocation started");

    // Stop the last server through the same slot.
    let stop = CommandConfig {
        cmd: "true".to_string(),
        ..server
    };
    assert_eq!(
        with_timeout(runner.run_command(KEY, &stop)).await,
        CommandOutcome::Success
    );
    for task in tasks {
        assert_eq!(
            with_timeout(task).await?,
            CommandOutcome::Failure(FailureReason::Terminated)
        );
    }

    let log = std::fs::read_to_string(&log_file)?;
    assert!(
        log.lines().all(|line| line == "clean"),
        "a new invocation started while the previous one was alive:\n{log}"
    );
    Ok(())
}

#[tokio::test]
async fn replaced_before_spawning_never_runs() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("ran");
    let runner = Arc::new(ShellRunner::new(None));

    let first = CommandConfig {
        cmd: "exec sleep 30".to_string(),
        parallel: true,
        restart: true,
    };
    let middle = CommandConfig {
        cmd: format!("touch {}; exec sleep 30", marker.display()),
        ..first.clone()
    };
    let last = CommandConfig {
        cmd: "true".to_string(),
        ..first.clone()
    };

    let first_task = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run_command(KEY, &first).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Both replacements are queued before either has been polled.
    let middle_fut = runner.run_command(KEY, &middle);
    let last_fut = runner.run_command(KEY, &last);
    let (middle_outcome, last_outcome) = with_timeout(async { tokio::join!(middle_fut, last_fut) }).await;

    assert_eq!(middle_outcome, CommandOutcome::Failure(FailureReason::Terminated));
    assert_eq!(last_outcome, CommandOutcome::Success);
    assert_eq!(
        with_timeout(first_task).await?,
        CommandOutcome::Failure(FailureReason::Terminated)
    );
    assert!(!marker.exists(), "superseded invocation spawned its process");
    Ok(())
}

#[tokio::test]
async fn restart_slots_are_per_command() {
    let runner = Arc::new(ShellRunner::new(None));
    let slow = CommandConfig {
        cmd: "sleep 0.3".to_string(),
        parallel: true,
        restart: true,
    };

    let first = {
        let runner = Arc::clone(&runner);
        let slow = slow.clone();
        tokio::spawn(async move { runner.run_command(KEY, &slow).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let other_key = CommandKey { rule: 1, command: 0 };
    assert_eq!(
        with_timeout(runner.run_command(other_key, &slow)).await,
        CommandOutcome::Success
    );
    assert_eq!(with_timeout(first).await.expect("task completed"), CommandOutcome::Success);
}

#[tokio::test]
async fn non_restart_commands_overlap() {
    let runner = Arc::new(ShellRunner::new(None));
    let cmd = CommandConfig::parallel("sleep 0.2");

    let first = {
        let runner = Arc::clone(&runner);
        let cmd = cmd.clone();
        tokio::spawn(async move { runner.run_command(KEY, &cmd).await })
    };
    let second = with_timeout(runner.run_command(KEY, &cmd)).await;

    assert_eq!(second, CommandOutcome::Success);
    assert_eq!(with_timeout(first).await.expect("task completed"), CommandOutcome::Success);
}

#[tokio::test]
async fn unknown_program_fails_with_shell_exit_code() {
    let outcome = with_timeout(run_shell("definitely-not-a-real-program-xyz", None, None)).await;
    assert_eq!(outcome, CommandOutcome::Failure(FailureReason::ExitCode(127)));
}

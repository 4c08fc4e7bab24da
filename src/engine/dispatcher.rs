// src/engine/dispatcher.rs

//! Runs the commands of every rule matching a changed path.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CommandConfig;
use crate::engine::rules::{CompiledRule, RuleSet};
use crate::exec::{CommandBackend, CommandKey, CommandOutcome};

/// What happened for one matched rule during a dispatch.
#[derive(Debug)]
pub struct RuleRun {
    /// Index of the rule in configuration order.
    pub rule: usize,
    /// Index of the pattern that matched.
    pub pattern: usize,
    /// Serial commands that ran, with their outcome, in order.
    pub serial: Vec<(usize, CommandOutcome)>,
    /// Parallel commands that were launched. Their outcome is already
    /// logged by the spawned task; awaiting the handle is optional.
    pub parallel: Vec<(usize, JoinHandle<CommandOutcome>)>,
    /// Serial command whose failure stopped the rule.
    pub halted_at: Option<usize>,
}

/// Result of one `Dispatcher::dispatch` call.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub rules: Vec<RuleRun>,
}

impl DispatchReport {
    pub fn matched(&self) -> bool {
        !self.rules.is_empty()
    }

    pub fn matched_rules(&self) -> Vec<usize> {
        self.rules.iter().map(|r| r.rule).collect()
    }

    /// Wait for every parallel command launched by this dispatch.
    pub async fn wait_parallel(self) -> Vec<(CommandKey, CommandOutcome)> {
        let mut outcomes = Vec::new();
        for run in self.rules {
            for (command, handle) in run.parallel {
                let key = CommandKey {
                    rule: run.rule,
                    command,
                };
                match handle.await {
                    Ok(outcome) => outcomes.push((key, outcome)),
                    Err(err) => warn!(rule = key.rule, command, error = %err, "parallel command task panicked"),
                }
            }
        }
        outcomes
    }
}

/// Matches changed paths against the rule set and drives the backend.
///
/// Execution policy per rule:
/// - Serial commands (`parallel = false`) are awaited. A failure stops the
///   rest of the rule, parallel commands after it included.
/// - Parallel commands are spawned and never awaited here; their outcome is
///   logged when they finish and cannot affect their siblings.
pub struct Dispatcher<B: CommandBackend> {
    rules: Arc<RuleSet>,
    backend: Arc<B>,
}

impl<B: CommandBackend> std::fmt::Debug for Dispatcher<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}

impl<B: CommandBackend> Dispatcher<B> {
    pub fn new(rules: RuleSet, backend: Arc<B>) -> Self {
        Self {
            rules: Arc::new(rules),
            backend,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run every rule matching `rel_path`, in configuration order.
    ///
    /// A rule runs at most once per call, however many of its patterns
    /// match. Returns after all serial commands have finished.
    pub async fn dispatch(&self, rel_path: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        for rule in self.rules.rules() {
            let Some(pattern) = rule.first_match(rel_path) else {
                continue;
            };
            info!(
                path = %rel_path,
                rule = rule.index(),
                pattern = %rule.patterns().patterns()[pattern].as_str(),
                "rule matched"
            );
            report.rules.push(self.run_rule(rule, pattern).await);
        }

        if !report.matched() {
            debug!(path = %rel_path, "no rule matched");
        }
        report
    }

    async fn run_rule(&self, rule: &CompiledRule, pattern: usize) -> RuleRun {
        let mut run = RuleRun {
            rule: rule.index(),
            pattern,
            serial: Vec::new(),
            parallel: Vec::new(),
            halted_at: None,
        };

        for (idx, command) in rule.commands().iter().enumerate() {
            let key = CommandKey {
                rule: rule.index(),
                command: idx,
            };

            if command.parallel {
                run.parallel.push((idx, self.launch_parallel(key, command.clone())));
                continue;
            }

            info!(rule = key.rule, cmd = %command.cmd, "running command");
            let outcome = self.backend.run_command(key, command).await;
            let failed = match &outcome {
                CommandOutcome::Success => {
                    info!(rule = key.rule, cmd = %command.cmd, "command succeeded");
                    false
                }
                CommandOutcome::Failure(reason) => {
                    warn!(
                        rule = key.rule,
                        cmd = %command.cmd,
                        %reason,
                        "command failed; skipping remaining commands of this rule"
                    );
                    true
                }
            };
            run.serial.push((idx, outcome));

            if failed {
                run.halted_at = Some(idx);
                break;
            }
        }

        run
    }

    /// Spawn a fire-and-forget command whose outcome is logged on completion.
    fn launch_parallel(&self, key: CommandKey, command: CommandConfig) -> JoinHandle<CommandOutcome> {
        let backend = Arc::clone(&self.backend);
        info!(rule = key.rule, cmd = %command.cmd, "launching parallel command");

        tokio::spawn(async move {
            let outcome = backend.run_command(key, &command).await;
            match &outcome {
                CommandOutcome::Success => {
                    info!(rule = key.rule, cmd = %command.cmd, "parallel command succeeded");
                }
                CommandOutcome::Failure(reason) => {
                    warn!(rule = key.rule, cmd = %command.cmd, %reason, "parallel command failed");
                }
            }
            outcome
        })
    }
}

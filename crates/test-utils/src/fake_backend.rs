use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use devloop::config::CommandConfig;
use devloop::exec::{CommandBackend, CommandKey, CommandOutcome, FailureReason};

/// One recorded call into the fake backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub key: CommandKey,
    pub cmd: String,
}

/// A fake command backend that:
/// - records every invocation in call order
/// - fails commands whose `cmd` was registered with `fail_with`
/// - optionally delays commands registered with `delay`, to observe
///   parallel launches and serial blocking
#[derive(Clone, Default)]
pub struct FakeBackend {
    started: Arc<Mutex<Vec<Invocation>>>,
    finished: Arc<Mutex<Vec<Invocation>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `cmd` fail with exit code 1.
    pub fn fail_with(&self, cmd: &str) {
        self.failing.lock().unwrap().insert(cmd.to_string());
    }

    /// Make `cmd` take `delay` before finishing.
    pub fn delay(&self, cmd: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(cmd.to_string(), delay);
    }

    /// Commands in the order they were started.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().iter().map(|i| i.cmd.clone()).collect()
    }

    /// Commands in the order they finished.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().iter().map(|i| i.cmd.clone()).collect()
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.started.lock().unwrap().clone()
    }
}

impl CommandBackend for FakeBackend {
    fn run_command<'a>(
        &'a self,
        key: CommandKey,
        command: &'a CommandConfig,
    ) -> Pin<Box<dyn Future<Output = CommandOutcome> + Send + 'a>> {
        Box::pin(async move {
            let invocation = Invocation {
                key,
                cmd: command.cmd.clone(),
            };
            self.started.lock().unwrap().push(invocation.clone());

            let delay = self.delays.lock().unwrap().get(&command.cmd).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let fails = self.failing.lock().unwrap().contains(&command.cmd);
            self.finished.lock().unwrap().push(invocation);

            if fails {
                CommandOutcome::Failure(FailureReason::ExitCode(1))
            } else {
                CommandOutcome::Success
            }
        })
    }
}

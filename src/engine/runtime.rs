// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::{DevloopError, Result};
use crate::exec::CommandBackend;
use crate::live::{is_frontend_asset, BroadcastReport, LiveReloadHub};

use super::debounce::Debouncer;
use super::dispatcher::{DispatchReport, Dispatcher};
use super::{RuntimeEvent, WatchEvent};

/// What the runtime did with one file change.
#[derive(Debug)]
pub enum ChangeOutcome {
    /// No rule matches and it is not a front-end asset; not debounced.
    Irrelevant,
    /// Inside the debounce window; dropped.
    Debounced,
    /// Admitted: rules were dispatched and, for front-end assets with live
    /// reload on, clients were told to reload.
    Handled {
        dispatch: DispatchReport,
        reload: Option<BroadcastReport>,
    },
}

/// Main event loop: debounces file changes, then dispatches matching rules
/// and the live reload broadcast concurrently.
///
/// Events are handled one at a time, so a new change is only looked at once
/// the serial commands of the previous one have finished.
pub struct Runtime<B: CommandBackend> {
    event_rx: mpsc::Receiver<RuntimeEvent>,
    debouncer: Debouncer,
    dispatcher: Dispatcher<B>,
    live_reload: Option<Arc<LiveReloadHub>>,
}

impl<B: CommandBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("debouncer", &self.debouncer)
            .field("dispatcher", &self.dispatcher)
            .field("live_reload", &self.live_reload.is_some())
            .finish_non_exhaustive()
    }
}

impl<B: CommandBackend> Runtime<B> {
    pub fn new(
        event_rx: mpsc::Receiver<RuntimeEvent>,
        debouncer: Debouncer,
        dispatcher: Dispatcher<B>,
        live_reload: Option<Arc<LiveReloadHub>>,
    ) -> Self {
        Self {
            event_rx,
            debouncer,
            dispatcher,
            live_reload,
        }
    }

    /// Run until shutdown is requested or the event channel closes.
    ///
    /// A failed watch source is fatal and returned as an error.
    pub async fn run(mut self) -> Result<()> {
        info!(
            rules = self.dispatcher.rules().len(),
            debounce = ?self.debouncer.window(),
            live_reload = self.live_reload.is_some(),
            "devloop runtime started"
        );

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            match event {
                RuntimeEvent::FileChanged(change) => {
                    self.handle_change(&change).await;
                }
                RuntimeEvent::WatchFailed(reason) => {
                    error!(%reason, "file watcher failed");
                    return Err(DevloopError::WatchSource(reason).into());
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Process one change: relevance, debounce, then dispatch and reload.
    pub async fn handle_change(&self, change: &WatchEvent) -> ChangeOutcome {
        let rel = change.rel_path.as_str();
        let reload = self.live_reload.is_some() && is_frontend_asset(rel);

        if !reload && !self.dispatcher.rules().is_relevant(rel) {
            debug!(path = %rel, "ignoring change with no matching rule");
            return ChangeOutcome::Irrelevant;
        }

        if !self.debouncer.admit(change) {
            debug!(path = %rel, "change debounced");
            return ChangeOutcome::Debounced;
        }

        info!(path = %rel, "file changed");

        let broadcast = async {
            match &self.live_reload {
                Some(hub) if reload => {
                    let report = hub.broadcast().await;
                    info!(
                        delivered = report.delivered.len(),
                        dropped = report.dropped.len(),
                        "live reload broadcast"
                    );
                    Some(report)
                }
                _ => None,
            }
        };

        let (dispatch, reload) = tokio::join!(self.dispatcher.dispatch(rel), broadcast);
        ChangeOutcome::Handled { dispatch, reload }
    }
}

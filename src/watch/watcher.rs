// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::engine::{RuntimeEvent, WatchEvent};
use crate::errors::{DevloopError, Result};
use crate::watch::ignore::IgnoreFilter;
use crate::watch::path_utils::relative_to_any;

/// Lifecycle of the filesystem watcher.
///
/// `Idle → Watching → (Failed | Stopped)`. Only `Watching` produces events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Watching,
    Failed,
    Stopped,
}

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle (or
/// calling [`WatcherHandle::stop`]) stops file watching.
pub struct WatcherHandle {
    inner: Option<RecommendedWatcher>,
    state: Arc<Mutex<WatcherState>>,
    registered: Vec<PathBuf>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("state", &self.state())
            .field("registered", &self.registered.len())
            .finish()
    }
}

impl WatcherHandle {
    pub fn state(&self) -> WatcherState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(WatcherState::Failed)
    }

    /// Directories registered at startup, in walk order.
    pub fn registered_dirs(&self) -> &[PathBuf] {
        &self.registered
    }

    pub fn stop(&mut self) {
        if self.inner.take().is_some() {
            set_state(&self.state, WatcherState::Stopped);
            info!("file watcher stopped");
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Walk every root and return the directories that should be registered.
///
/// `filter` sees paths relative to their root, so a root is never ignored
/// itself. Rejected directories are pruned together with their whole
/// subtree. Any root or directory that cannot be read is an error.
pub fn collect_watch_dirs(roots: &[PathBuf], filter: &IgnoreFilter) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();

    for root in roots {
        if !root.is_dir() {
            return Err(DevloopError::WatchRegistration {
                path: root.clone(),
                reason: "not a directory or not accessible".to_string(),
            });
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
                !(entry.file_type().is_dir() && filter.is_ignored(rel))
            });

        for entry in walker {
            let entry = entry.map_err(|e| DevloopError::WatchRegistration {
                path: e.path().unwrap_or(root.as_path()).to_path_buf(),
                reason: e.to_string(),
            })?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }
    }

    Ok(dirs)
}

/// Register every non-ignored directory under `roots` with the OS
/// notification source and forward changes into the runtime as
/// `RuntimeEvent::FileChanged`.
///
/// - Registration is non-recursive per directory, so directories created
///   after startup are not watched.
/// - Event paths are relativized against the (canonicalized) roots. Events
///   whose directory is ignored (e.g. a newly created `node_modules/`) are
///   dropped; file names are never checked against ignore tokens.
/// - An error from the notification source sends `RuntimeEvent::WatchFailed`
///   and ends forwarding; the runtime treats it as fatal.
pub fn spawn_watcher(
    roots: &[PathBuf],
    filter: IgnoreFilter,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let state = Arc::new(Mutex::new(WatcherState::Idle));

    let dirs = collect_watch_dirs(roots, &filter)?;
    let canon_roots: Vec<PathBuf> = roots
        .iter()
        .map(|r| r.canonicalize().unwrap_or_else(|_| r.clone()))
        .collect();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // The receiver only goes away once forwarding has ended.
            let _ = event_tx.send(res);
        },
        Config::default(),
    )?;

    for dir in &dirs {
        let target = dir.canonicalize().unwrap_or_else(|_| dir.clone());
        watcher
            .watch(&target, RecursiveMode::NonRecursive)
            .map_err(|e| DevloopError::WatchRegistration {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
        debug!(dir = %dir.display(), "registered directory");
    }

    set_state(&state, WatcherState::Watching);
    info!(roots = ?roots, dirs = dirs.len(), "file watcher started");

    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        while let Some(res) = event_rx.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    error!(error = %err, "file watch source failed");
                    set_state(&task_state, WatcherState::Failed);
                    let _ = runtime_tx
                        .send(RuntimeEvent::WatchFailed(err.to_string()))
                        .await;
                    return;
                }
            };

            if !is_content_change(&event.kind) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in event.paths {
                let Some(rel_path) = relative_to_any(&canon_roots, &path) else {
                    warn!(path = %path.display(), "could not relativize event path against any root");
                    continue;
                };
                if rel_path.is_empty() || in_ignored_dir(&filter, &path, &rel_path) {
                    continue;
                }

                let change = WatchEvent {
                    path,
                    rel_path,
                    at: Instant::now(),
                };
                if let Err(err) = runtime_tx.send(RuntimeEvent::FileChanged(change)).await {
                    // Runtime is gone; nothing left to deliver to.
                    debug!("runtime channel closed; stopping event forwarding: {err}");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        inner: Some(watcher),
        state,
        registered: dirs,
    })
}

/// Ignore tokens name directories, so only the directory part of an event
/// is checked: the path itself when it is a directory, otherwise its parent.
/// A file named `legit.go` is never dropped for token `git`.
fn in_ignored_dir(filter: &IgnoreFilter, path: &Path, rel_path: &str) -> bool {
    let rel = Path::new(rel_path);
    let dir = if path.is_dir() {
        Some(rel)
    } else {
        rel.parent()
    };
    dir.is_some_and(|dir| filter.is_ignored(dir))
}

/// Access notifications (open/close/read) do not change content.
fn is_content_change(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_) | EventKind::Other)
}

fn set_state(state: &Mutex<WatcherState>, next: WatcherState) {
    if let Ok(mut guard) = state.lock() {
        // A failure is terminal; a later stop does not hide it.
        if *guard != WatcherState::Failed {
            *guard = next;
        }
    }
}

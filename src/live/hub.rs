// src/live/hub.rs

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::live::RELOAD_MESSAGE;

/// How long one client may take to accept a message before it is dropped.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Identifier handed out by [`LiveReloadHub::register`].
pub type ClientId = u64;

/// Outgoing half of one live reload connection.
///
/// The WebSocket implementation lives in `server.rs`; tests use in-memory
/// sinks.
pub trait ReloadSink: Send + 'static {
    /// Send one text message to the client.
    fn send_text<'a>(
        &'a mut self,
        text: &'static str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Close the connection. Called after a failed send; errors are ignored.
    fn close(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Outcome of one [`LiveReloadHub::broadcast`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients that received the message.
    pub delivered: Vec<ClientId>,
    /// Clients whose send failed; they have been removed.
    pub dropped: Vec<ClientId>,
}

/// Set of connected live reload clients.
///
/// Registration, removal and broadcast all go through one async mutex, so a
/// broadcast that drops dead clients never races with a new registration.
/// Each send is bounded by the send timeout, so a stalled client costs at
/// most that long and is then treated as failed.
pub struct LiveReloadHub {
    clients: Mutex<BTreeMap<ClientId, Box<dyn ReloadSink>>>,
    next_id: AtomicU64,
    send_timeout: Duration,
}

impl Default for LiveReloadHub {
    fn default() -> Self {
        Self::with_send_timeout(DEFAULT_SEND_TIMEOUT)
    }
}

impl std::fmt::Debug for LiveReloadHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveReloadHub")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

impl LiveReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            clients: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
            send_timeout,
        }
    }

    pub async fn register(&self, sink: Box<dyn ReloadSink>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients.lock().await.insert(id, sink);
        debug!(client = id, "live reload client registered");
        id
    }

    /// Remove a client. Returns false if it was already gone (for example
    /// dropped by a failed broadcast).
    pub async fn unregister(&self, id: ClientId) -> bool {
        let removed = self.clients.lock().await.remove(&id).is_some();
        if removed {
            debug!(client = id, "live reload client unregistered");
        }
        removed
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Send `"reload"` to every registered client.
    ///
    /// Clients whose send fails or exceeds the send timeout are closed and
    /// removed under the same lock.
    pub async fn broadcast(&self) -> BroadcastReport {
        let mut clients = self.clients.lock().await;
        let mut report = BroadcastReport::default();

        for (id, sink) in clients.iter_mut() {
            match tokio::time::timeout(self.send_timeout, sink.send_text(RELOAD_MESSAGE)).await {
                Ok(Ok(())) => report.delivered.push(*id),
                Ok(Err(err)) => {
                    warn!(client = *id, error = %err, "failed to send live reload message; dropping client");
                    report.dropped.push(*id);
                }
                Err(_) => {
                    warn!(client = *id, timeout = ?self.send_timeout, "live reload send timed out; dropping client");
                    report.dropped.push(*id);
                }
            }
        }

        for id in &report.dropped {
            if let Some(mut sink) = clients.remove(id) {
                let _ = tokio::time::timeout(self.send_timeout, sink.close()).await;
            }
        }

        report
    }
}

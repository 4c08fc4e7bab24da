// src/live/server.rs

//! WebSocket endpoint for live reload clients.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{DevloopError, Result};
use crate::live::hub::{LiveReloadHub, ReloadSink};

/// Route that upgrades to the live reload WebSocket.
pub const LIVE_RELOAD_PATH: &str = "/livereload";

struct WsSink(SplitSink<WebSocket, Message>);

impl ReloadSink for WsSink {
    fn send_text<'a>(
        &'a mut self,
        text: &'static str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.0
                .send(Message::Text(Utf8Bytes::from_static(text)))
                .await
                .map_err(|e| DevloopError::LiveReload(e.to_string()))
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let _ = self.0.close().await;
        })
    }
}

pub fn router(hub: Arc<LiveReloadHub>) -> Router {
    Router::new()
        .route(LIVE_RELOAD_PATH, get(ws_upgrade))
        .with_state(hub)
}

/// Bind the live reload port on all interfaces.
///
/// Done before watching starts so a busy port aborts startup.
pub async fn bind(port: u16) -> Result<TcpListener> {
    TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| DevloopError::LiveReload(format!("binding port {port}: {e}")))
}

/// Serve the live reload endpoint until the listener fails.
pub async fn serve(listener: TcpListener, hub: Arc<LiveReloadHub>) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, path = LIVE_RELOAD_PATH, "live reload server listening");

    axum::serve(
        listener,
        router(hub).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Run [`serve`] in the background, logging if it ever stops with an error.
pub fn spawn_server(listener: TcpListener, hub: Arc<LiveReloadHub>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = serve(listener, hub).await {
            error!(error = %err, "live reload server stopped");
        }
    })
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(hub): State<Arc<LiveReloadHub>>,
) -> impl IntoResponse {
    ws.on_failed_upgrade(move |err| {
        warn!(%peer, error = %err, "live reload websocket upgrade failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, peer, hub))
}

/// Register the outgoing half, then read until the client goes away.
///
/// Inbound frames carry no meaning; they are read only to notice a close
/// frame, an error or the end of the stream.
async fn handle_socket(socket: WebSocket, peer: SocketAddr, hub: Arc<LiveReloadHub>) {
    let (sender, mut receiver) = socket.split();
    let id = hub.register(Box::new(WsSink(sender))).await;
    info!(client = id, %peer, "live reload client connected");

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(err) => {
                debug!(client = id, %peer, error = %err, "live reload connection error");
                break;
            }
        }
    }

    if hub.unregister(id).await {
        info!(client = id, %peer, "live reload client disconnected");
    }
}

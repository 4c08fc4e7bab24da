// src/live/mod.rs

//! Browser live reload.
//!
//! - [`hub`] owns the set of connected clients and the broadcast.
//! - [`server`] exposes the WebSocket endpoint (`axum`) that feeds the hub.
//!
//! The protocol has a single server-to-client message, the text `"reload"`.

use std::path::Path;

pub mod hub;
pub mod server;

pub use hub::{BroadcastReport, ClientId, LiveReloadHub, ReloadSink, DEFAULT_SEND_TIMEOUT};
pub use server::{bind, router, serve, spawn_server, LIVE_RELOAD_PATH};

/// Text payload sent to every client on a front-end change.
pub const RELOAD_MESSAGE: &str = "reload";

/// Extensions whose change triggers a browser reload.
pub const FRONTEND_EXTENSIONS: [&str; 3] = ["html", "css", "js"];

/// True for `.html`, `.css` and `.js` files.
pub fn is_frontend_asset(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| FRONTEND_EXTENSIONS.contains(&ext))
}

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use devloop::errors::{DevloopError, Result};
use devloop::live::ReloadSink;

/// In-memory live reload client.
///
/// Keep a clone to inspect what the hub sent once a copy has been
/// boxed and registered.
#[derive(Clone, Default)]
pub struct FakeSink {
    received: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every send fails, like a browser tab that went away.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    /// A sink whose sends never complete, like a client with a full
    /// socket buffer.
    pub fn stalled() -> Self {
        let sink = Self::default();
        sink.stalled.store(true, Ordering::SeqCst);
        sink
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn boxed(&self) -> Box<dyn ReloadSink> {
        Box::new(self.clone())
    }
}

impl ReloadSink for FakeSink {
    fn send_text<'a>(
        &'a mut self,
        text: &'static str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.stalled.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(DevloopError::LiveReload("client went away".to_string()));
            }
            self.received.lock().unwrap().push(text.to_string());
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
        })
    }
}

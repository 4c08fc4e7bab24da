// src/engine/debounce.rs

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::engine::WatchEvent;

/// Global debounce gate.
///
/// Keeps the instant of the last admitted event. A new event is admitted
/// only when at least `window` has elapsed since then; everything else is
/// dropped, not queued for later. The window is shared by all paths, so a
/// save touching many files yields at most one dispatch per window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_admitted: Mutex<Option<Instant>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_admitted: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn admit(&self, event: &WatchEvent) -> bool {
        self.admit_at(event.at)
    }

    /// Admit an event stamped `at`. Events older than the last admission
    /// are dropped.
    pub fn admit_at(&self, at: Instant) -> bool {
        let mut last = self
            .last_admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let admitted = match *last {
            None => true,
            Some(prev) => at
                .checked_duration_since(prev)
                .is_some_and(|elapsed| elapsed >= self.window),
        };

        if admitted {
            *last = Some(at);
        }
        admitted
    }

    pub fn last_admitted(&self) -> Option<Instant> {
        *self
            .last_admitted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

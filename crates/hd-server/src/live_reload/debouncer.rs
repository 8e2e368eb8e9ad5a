//! Per-path change debouncing.
//!
//! Editors emit several raw events per save (truncate, write, attribute
//! update). The debouncer folds those into one change per path once the path
//! has been quiet for the debounce window.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe change debouncer.
pub(crate) struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, Instant>>,
    debounce_duration: Duration,
}

impl EventDebouncer {
    /// Create a new debouncer with the specified debounce duration.
    pub(crate) fn new(debounce_duration: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            debounce_duration,
        }
    }

    /// Record a change, pushing the path's deadline back.
    pub(crate) fn record(&self, path: PathBuf) {
        let deadline = Instant::now() + self.debounce_duration;
        self.lock().insert(path, deadline);
    }

    /// Drain paths whose deadline has passed, sorted for stable ordering.
    pub(crate) fn drain_ready(&self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready: Vec<PathBuf> = self
            .lock()
            .extract_if(|_, deadline| *deadline <= now)
            .map(|(path, _)| path)
            .collect();
        ready.sort();
        ready
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Instant>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

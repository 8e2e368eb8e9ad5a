//! Rebuild-on-change loop.
//!
//! Watches the bundler input directory and runs one build pass per settled
//! batch of changes. This is the bundler's own file watch; it knows nothing
//! about live reload beyond the hooks registered on the context.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecursiveMode, Watcher};

use crate::{BuildContext, BuildError};

/// How often the rebuild thread checks for settled changes and shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a running rebuild watcher.
///
/// Dropping the handle stops the watcher thread.
pub struct WatchHandle {
    _shutdown: Option<mpsc::Sender<()>>,
}

impl WatchHandle {
    fn new(shutdown: mpsc::Sender<()>) -> Self {
        Self {
            _shutdown: Some(shutdown),
        }
    }

    /// Stop watching immediately (consumes the handle).
    pub fn stop(mut self) {
        self._shutdown.take();
    }
}

/// Changed paths accumulated since the last rebuild.
struct ChangeBatch {
    pending: HashSet<PathBuf>,
    last_change: Option<Instant>,
}

impl ChangeBatch {
    fn new() -> Self {
        Self {
            pending: HashSet::new(),
            last_change: None,
        }
    }

    fn add(&mut self, path: PathBuf) {
        self.pending.insert(path);
        self.last_change = Some(Instant::now());
    }

    /// Whether changes are pending and none arrived within `quiet`.
    fn is_settled(&self, quiet: Duration) -> bool {
        self.last_change
            .is_some_and(|last| !self.pending.is_empty() && last.elapsed() >= quiet)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_change = None;
        self.pending.drain().collect()
    }
}

/// Whether a raw event can change bundler output.
fn is_input_change(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

impl BuildContext {
    /// Rebuild whenever files under `dir` change.
    ///
    /// Changes are batched until no new change has arrived for `debounce`,
    /// then one pass runs (calling every end-of-build hook once). Changes
    /// inside the output directory are ignored. The initial build is the
    /// caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched.
    pub fn watch(
        self: Arc<Self>,
        dir: &Path,
        debounce: Duration,
    ) -> Result<WatchHandle, BuildError> {
        let (change_tx, change_rx) = mpsc::channel::<PathBuf>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let outdir = self.options().outdir_path();
        let handler = move |res: notify::Result<notify::Event>| match res {
            Ok(event) if is_input_change(event.kind) => {
                for path in event.paths {
                    if !path.starts_with(&outdir) {
                        let _ = change_tx.send(path);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Rebuild watcher error"),
        };

        let mut watcher =
            notify::recommended_watcher(handler).map_err(|source| BuildError::Watch {
                path: dir.to_path_buf(),
                source,
            })?;

        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|source| BuildError::Watch {
                path: dir.to_path_buf(),
                source,
            })?;

        tracing::info!(dir = %dir.display(), "Watching bundler inputs");

        // The watcher moves into the thread to stay alive until shutdown.
        std::thread::spawn(move || {
            let _watcher = watcher;
            let mut batch = ChangeBatch::new();

            loop {
                match shutdown_rx.try_recv() {
                    Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
                    Err(mpsc::TryRecvError::Empty) => {}
                }

                match change_rx.recv_timeout(POLL_INTERVAL) {
                    Ok(path) => batch.add(path),
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }

                if batch.is_settled(debounce) {
                    let changed = batch.take();
                    tracing::debug!(count = changed.len(), "Bundler inputs changed, rebuilding");
                    if let Err(e) = self.rebuild() {
                        tracing::error!(error = %e, "Rebuild failed to run");
                    }
                }
            }
        });

        Ok(WatchHandle::new(shutdown_tx))
    }
}

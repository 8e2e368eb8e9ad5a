//! Filesystem change source.
//!
//! Watches files that live outside the bundler's input graph (the top-level
//! HTML page, plus source globs) and reports each change to the notifier.
//! Files that already exist when watching starts produce nothing until they
//! change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use glob::{MatchOptions, Pattern};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::debouncer::EventDebouncer;
use super::notifier::Notify;
use crate::ServerError;

/// Default debounce duration in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// How often settled changes are drained.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Watches a fixed set of globs under a project root.
pub struct FileWatcher {
    root: PathBuf,
    raw_patterns: Vec<String>,
    patterns: Arc<Vec<Pattern>>,
    notifier: Arc<dyn Notify>,
    watcher: Option<RecommendedWatcher>,
    debounce: Duration,
    /// Record and report tasks, aborted on drop.
    tasks: Vec<JoinHandle<()>>,
}

impl FileWatcher {
    /// Create a watcher for `patterns` relative to `root`.
    ///
    /// Patterns use glob syntax plus non-nested brace groups, e.g.
    /// `src/**/*.{css,js}`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn new(
        root: &Path,
        patterns: &[String],
        notifier: Arc<dyn Notify>,
    ) -> Result<Self, ServerError> {
        let raw_patterns: Vec<String> = patterns.iter().flat_map(|p| expand_braces(p)).collect();
        let compiled = raw_patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| ServerError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: root.canonicalize().unwrap_or_else(|_| root.to_path_buf()),
            raw_patterns,
            patterns: Arc::new(compiled),
            notifier,
            watcher: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            tasks: Vec::new(),
        })
    }

    /// Set the debounce duration.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching.
    ///
    /// Registers the OS watches and spawns the tasks that turn raw events into
    /// notifications. Must be called from within a tokio runtime. Watch
    /// directories that do not exist are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS watcher cannot be created or a directory
    /// cannot be watched.
    pub fn start(&mut self) -> Result<(), ServerError> {
        let (tx, mut rx) = mpsc::channel::<Event>(100);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                // The callback runs on notify's own thread.
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => tracing::warn!(error = %e, "File watcher error"),
            }
        })
        .map_err(|source| ServerError::Watch {
            path: self.root.clone(),
            source,
        })?;

        for (dir, mode) in watch_targets(&self.root, &self.raw_patterns) {
            if !dir.is_dir() {
                tracing::warn!(path = %dir.display(), "Watch directory does not exist, skipping");
                continue;
            }
            watcher
                .watch(&dir, mode)
                .map_err(|source| ServerError::Watch {
                    path: dir.clone(),
                    source,
                })?;
            tracing::debug!(path = %dir.display(), ?mode, "Watching directory");
        }
        self.watcher = Some(watcher);

        let debouncer = Arc::new(EventDebouncer::new(self.debounce));
        let debouncer_for_record = Arc::clone(&debouncer);

        // Spawn task to record events into debouncer
        let root_for_record = self.root.clone();
        let patterns = Arc::clone(&self.patterns);

        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                Self::record_event(&event, &root_for_record, &patterns, &debouncer_for_record);
            }
        }));

        // Spawn task to report settled changes
        let notifier = Arc::clone(&self.notifier);
        let root_for_report = self.root.clone();

        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);

            loop {
                interval.tick().await;

                for path in debouncer.drain_ready() {
                    let Some(relative) = relative_path(&path, &root_for_report) else {
                        continue;
                    };
                    notifier.notify(Some(&format!("{relative} changed, reloading...")));
                }
            }
        }));

        tracing::info!(patterns = ?self.raw_patterns, "Watching for changes");
        Ok(())
    }

    /// Record a raw filesystem event into the debouncer.
    fn record_event(event: &Event, root: &Path, patterns: &[Pattern], debouncer: &EventDebouncer) {
        if !is_change(event.kind) {
            return;
        }

        for path in &event.paths {
            if !matches_patterns(path, root, patterns) {
                continue;
            }

            debouncer.record(path.clone());
            tracing::debug!(path = %path.display(), kind = ?event.kind, "Recorded file change");
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Whether an event kind counts as a change to an existing file.
///
/// Creation, removal and the source half of a rename are not changes.
fn is_change(kind: EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Name(mode)) => {
            matches!(mode, RenameMode::To | RenameMode::Both)
        }
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Path relative to `root` with forward slashes, or `None` if outside it.
fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}

/// Check if a path matches any watch pattern.
fn matches_patterns(path: &Path, root: &Path, patterns: &[Pattern]) -> bool {
    let Some(relative) = relative_path(path, root) else {
        return false;
    };

    patterns
        .iter()
        .any(|pattern| pattern.matches_with(&relative, MATCH_OPTIONS))
}

/// Expand non-nested brace groups: `*.{css,js}` becomes `*.css`, `*.js`.
///
/// Unbalanced braces are kept literally.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_owned()];
    };
    let Some(close) = pattern[open..].find('}').map(|i| open + i) else {
        return vec![pattern.to_owned()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    pattern[open + 1..close]
        .split(',')
        .flat_map(|alternative| expand_braces(&format!("{prefix}{alternative}{suffix}")))
        .collect()
}

/// Directories to register with the OS watcher.
///
/// A literal file pattern watches its parent directory non-recursively, so
/// editors that save by replacing the file are still seen. A glob watches
/// its literal directory prefix recursively.
fn watch_targets(root: &Path, patterns: &[String]) -> Vec<(PathBuf, RecursiveMode)> {
    let mut targets: BTreeMap<PathBuf, RecursiveMode> = BTreeMap::new();

    for pattern in patterns {
        let components: Vec<&str> = pattern.split('/').collect();
        let literal: Vec<&str> = components
            .iter()
            .take_while(|c| !c.contains(['*', '?', '[']))
            .copied()
            .collect();

        let (dir, mode) = if literal.len() == components.len() {
            let file = root.join(pattern);
            let parent = file.parent().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            (parent, RecursiveMode::NonRecursive)
        } else {
            (root.join(literal.join("/")), RecursiveMode::Recursive)
        };

        let entry = targets.entry(dir).or_insert(mode);
        if mode == RecursiveMode::Recursive {
            *entry = RecursiveMode::Recursive;
        }
    }

    targets.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Instant;

    fn compile(patterns: &[&str]) -> Vec<Pattern> {
        patterns
            .iter()
            .flat_map(|p| expand_braces(p))
            .map(|p| Pattern::new(&p).unwrap())
            .collect()
    }

    fn default_patterns() -> Vec<String> {
        vec![
            "index.html".to_owned(),
            "src/**/*.{css,js,ts,jsm,jsx}".to_owned(),
        ]
    }

    /// Notifier double recording every reason.
    #[derive(Default)]
    struct RecordingNotify {
        reasons: Mutex<Vec<Option<String>>>,
    }

    impl RecordingNotify {
        fn reasons(&self) -> Vec<Option<String>> {
            self.reasons.lock().unwrap().clone()
        }
    }

    impl Notify for RecordingNotify {
        fn notify(&self, reason: Option<&str>) {
            self.reasons.lock().unwrap().push(reason.map(str::to_owned));
        }
    }

    async fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        condition()
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(
            expand_braces("src/**/*.{css,js}"),
            vec!["src/**/*.css", "src/**/*.js"]
        );
        assert_eq!(
            expand_braces("{a,b}/*.{x,y}"),
            vec!["a/*.x", "a/*.y", "b/*.x", "b/*.y"]
        );
        assert_eq!(expand_braces("index.html"), vec!["index.html"]);
        assert_eq!(expand_braces("src/{oops"), vec!["src/{oops"]);
    }

    #[test]
    fn test_matches_default_patterns() {
        let root = PathBuf::from("/project");
        let patterns = compile(&["index.html", "src/**/*.{css,js,ts,jsm,jsx}"]);

        assert!(matches_patterns(&root.join("index.html"), &root, &patterns));
        assert!(matches_patterns(&root.join("src/main.js"), &root, &patterns));
        assert!(matches_patterns(&root.join("src/widgets/grid.ts"), &root, &patterns));
        assert!(matches_patterns(&root.join("src/styles.css"), &root, &patterns));
        assert!(!matches_patterns(&root.join("src/logo.png"), &root, &patterns));
        assert!(!matches_patterns(&root.join("pages/index.html"), &root, &patterns));
        assert!(!matches_patterns(&root.join("dist/main.js"), &root, &patterns));
    }

    #[test]
    fn test_matches_outside_root() {
        let root = PathBuf::from("/project");
        let patterns = compile(&["**/*.html"]);

        assert!(!matches_patterns(&PathBuf::from("/other/index.html"), &root, &patterns));
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        let root = PathBuf::from("/project");
        let patterns = compile(&["src/*.css"]);

        assert!(matches_patterns(&root.join("src/a.css"), &root, &patterns));
        assert!(!matches_patterns(&root.join("src/nested/a.css"), &root, &patterns));
    }

    #[test]
    fn test_watch_targets_default_patterns() {
        let root = PathBuf::from("/project");
        let expanded: Vec<String> = default_patterns()
            .iter()
            .flat_map(|p| expand_braces(p))
            .collect();

        assert_eq!(
            watch_targets(&root, &expanded),
            vec![
                (PathBuf::from("/project"), RecursiveMode::NonRecursive),
                (PathBuf::from("/project/src"), RecursiveMode::Recursive),
            ]
        );
    }

    #[test]
    fn test_watch_targets_recursive_wins() {
        let root = PathBuf::from("/project");
        let patterns = vec!["index.html".to_owned(), "**/*.html".to_owned()];

        assert_eq!(
            watch_targets(&root, &patterns),
            vec![(PathBuf::from("/project"), RecursiveMode::Recursive)]
        );
    }

    #[test]
    fn test_is_change() {
        use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

        assert!(is_change(EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_change(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(is_change(EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!is_change(EventKind::Modify(ModifyKind::Name(RenameMode::From))));
        assert!(!is_change(EventKind::Create(CreateKind::File)));
        assert!(!is_change(EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = PathBuf::from("/project");
        assert_eq!(
            relative_path(&root.join("src").join("a.css"), &root),
            Some("src/a.css".to_owned())
        );
        assert_eq!(relative_path(Path::new("/elsewhere/a.css"), &root), None);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let notifier: Arc<dyn Notify> = Arc::new(RecordingNotify::default());
        let result = FileWatcher::new(Path::new("."), &["src/[".to_owned()], notifier);
        assert!(matches!(result, Err(ServerError::Pattern { .. })));
    }

    #[tokio::test]
    async fn test_existing_files_are_silent_until_changed() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("a.css"), "body {}").unwrap();

        let recorder = Arc::new(RecordingNotify::default());
        let mut watcher = FileWatcher::new(
            dir.path(),
            &default_patterns(),
            Arc::<RecordingNotify>::clone(&recorder),
        )
        .unwrap();
        watcher.start().unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(recorder.reasons().is_empty());

        std::fs::write(src.join("a.css"), "body { margin: 0 }").unwrap();

        assert!(wait_for(Duration::from_secs(5), || !recorder.reasons().is_empty()).await);
        tokio::time::sleep(Duration::from_millis(300)).await;

        let reasons = recorder.reasons();
        assert_eq!(reasons.len(), 1);
        let reason = reasons[0].as_deref().unwrap();
        assert!(reason.contains("a.css"), "unexpected reason: {reason}");
        assert_eq!(reason, "src/a.css changed, reloading...");
    }

    #[tokio::test]
    async fn test_unwatched_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("notes.md"), "draft").unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let recorder = Arc::new(RecordingNotify::default());
        let mut watcher = FileWatcher::new(
            dir.path(),
            &default_patterns(),
            Arc::<RecordingNotify>::clone(&recorder),
        )
        .unwrap();
        watcher.start().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        std::fs::write(src.join("notes.md"), "final").unwrap();
        std::fs::write(dir.path().join("index.html"), "<html><body></body></html>").unwrap();

        assert!(wait_for(Duration::from_secs(5), || !recorder.reasons().is_empty()).await);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(
            recorder.reasons(),
            vec![Some("index.html changed, reloading...".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_drop_stops_background_tasks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let recorder = Arc::new(RecordingNotify::default());
        let mut watcher = FileWatcher::new(
            dir.path(),
            &default_patterns(),
            Arc::<RecordingNotify>::clone(&recorder),
        )
        .unwrap();
        watcher.start().unwrap();
        assert!(Arc::strong_count(&recorder) > 2);

        drop(watcher);

        // The report task held the last other reference to the notifier.
        assert!(
            wait_for(Duration::from_secs(2), || Arc::strong_count(&recorder) == 1).await,
            "notifier still referenced after drop"
        );
        std::fs::write(dir.path().join("index.html"), "<html><body></body></html>").unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(recorder.reasons().is_empty());
    }
}

//! Build error types.

use std::path::PathBuf;

/// Failure to run a build pass at all.
///
/// A bundler that runs and reports compile errors is not a `BuildError`; that
/// outcome is a [`BuildResult`](crate::BuildResult) with a failing exit code.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Bundler command line is empty.
    #[error("Bundler command is empty")]
    EmptyCommand,

    /// Bundler program could not be started.
    #[error("Failed to run bundler '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Rebuild watcher could not be set up.
    #[error("Failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Unknown output format name.
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

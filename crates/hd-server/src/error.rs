//! Dev server errors.

use std::io;
use std::path::PathBuf;

use hd_build::BuildError;

/// Error starting or running the dev server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Invalid watch pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Cannot watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

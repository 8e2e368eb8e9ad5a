//! Bundler abstraction and the esbuild subprocess implementation.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::{BuildError, BuildOptions};

/// Outcome of one completed bundler pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildResult {
    /// Bundler exit code (`None` if it was killed by a signal).
    pub exit_code: Option<i32>,
    /// Wall-clock duration of the pass.
    pub duration: Duration,
}

impl BuildResult {
    /// Whether the pass produced output without errors.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one bundler pass.
///
/// Implementations report their own diagnostics (warnings and errors) to the
/// terminal; the returned [`BuildResult`] only says whether the pass succeeded.
pub trait Bundler: Send + Sync {
    /// Bundle once with the given options.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pass could not be run at all.
    fn bundle(&self, options: &BuildOptions) -> Result<BuildResult, BuildError>;
}

/// esbuild-compatible command-line bundler.
#[derive(Clone, Debug)]
pub struct EsbuildCommand {
    program: String,
    leading_args: Vec<String>,
}

impl EsbuildCommand {
    /// Create from a command line such as `["npx", "esbuild"]`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyCommand`] if `command` is empty.
    pub fn new(command: Vec<String>) -> Result<Self, BuildError> {
        let mut parts = command.into_iter();
        let program = parts.next().ok_or(BuildError::EmptyCommand)?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
        })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for a pass with `options`.
    #[must_use]
    pub fn args(&self, options: &BuildOptions) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend(options.entry_points.iter().cloned());

        if options.bundle {
            args.push("--bundle".to_owned());
        }
        args.push(format!("--outdir={}", options.outdir));
        args.push(format!("--format={}", options.format));
        if options.splitting {
            args.push("--splitting".to_owned());
        }
        if options.sourcemap {
            args.push("--sourcemap".to_owned());
        }
        if options.minify {
            args.push("--minify".to_owned());
        }
        args.push(format!("--log-level={}", options.log_level));

        args
    }
}

impl Bundler for EsbuildCommand {
    fn bundle(&self, options: &BuildOptions) -> Result<BuildResult, BuildError> {
        let args = self.args(options);
        tracing::debug!(program = %self.program, ?args, "Running bundler");

        let start = Instant::now();
        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&options.working_dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| BuildError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        Ok(BuildResult {
            exit_code: status.code(),
            duration: start.elapsed(),
        })
    }
}

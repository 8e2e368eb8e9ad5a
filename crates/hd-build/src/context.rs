//! Build context: a bundler, its options, and end-of-build hooks.

use std::sync::Arc;

use crate::{BuildError, BuildOptions, BuildResult, Bundler};

/// Callback invoked once at the end of every completed build pass.
pub type BuildHook = Box<dyn Fn(&BuildResult) + Send + Sync>;

/// Reusable build configuration with registered end-of-build hooks.
pub struct BuildContext {
    bundler: Arc<dyn Bundler>,
    options: BuildOptions,
    hooks: Vec<BuildHook>,
}

impl BuildContext {
    /// Create a context with no hooks.
    #[must_use]
    pub fn new(bundler: Arc<dyn Bundler>, options: BuildOptions) -> Self {
        Self {
            bundler,
            options,
            hooks: Vec::new(),
        }
    }

    /// Register a hook to run after every completed pass, successful or not.
    pub fn on_end(&mut self, hook: impl Fn(&BuildResult) + Send + Sync + 'static) -> &mut Self {
        self.hooks.push(Box::new(hook));
        self
    }

    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Run one bundler pass, then every hook exactly once with its result.
    ///
    /// Hooks are skipped when the pass could not run at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundler could not be started.
    pub fn rebuild(&self) -> Result<BuildResult, BuildError> {
        let result = self.bundler.bundle(&self.options)?;

        if result.succeeded() {
            tracing::info!(
                elapsed_ms = result.duration.as_secs_f64() * 1000.0,
                "Build finished"
            );
        } else {
            tracing::warn!(exit_code = ?result.exit_code, "Build failed");
        }

        for hook in &self.hooks {
            hook(&result);
        }

        Ok(result)
    }
}

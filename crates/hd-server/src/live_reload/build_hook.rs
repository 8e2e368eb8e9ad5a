//! Reload after bundler rebuilds.

use std::sync::Arc;

use hd_build::BuildResult;

use super::notifier::Notify;

/// Reason logged when a rebuild triggers a reload.
pub const BUILD_COMPLETE_REASON: &str = "Build complete, reloading...";

/// End-of-build hook that reloads clients after each successful pass.
///
/// Failed passes leave the page as it is so the bundler's error output stays
/// the most recent thing on screen.
pub fn reload_on_build(notifier: Arc<dyn Notify>) -> impl Fn(&BuildResult) + Send + Sync + 'static {
    move |result: &BuildResult| {
        if result.succeeded() {
            notifier.notify(Some(BUILD_COMPLETE_REASON));
        } else {
            tracing::debug!(exit_code = ?result.exit_code, "Build failed, not reloading");
        }
    }
}

//! Production mode: one minified build, no watchers, no reload channel.

use std::sync::Arc;

use hd_build::{BuildMode, BuildResult, Bundler, EsbuildCommand};
use hd_config::Config;
use hd_server::build_context;

use crate::error::CliError;
use crate::output::Output;

/// Run a single production build with the configured bundler.
///
/// # Errors
///
/// Returns an error if the bundler cannot be started or the build fails.
pub(crate) fn execute(config: &Config) -> Result<(), CliError> {
    let bundler = Arc::new(EsbuildCommand::new(config.build.bundler.clone())?);
    run(config, bundler)
}

/// Run a single production build with `bundler`.
fn run(config: &Config, bundler: Arc<dyn Bundler>) -> Result<(), CliError> {
    let output = Output::new();

    let ctx = build_context(config, BuildMode::Production, bundler, None)?;
    output.info(&format!(
        "Building {} into {}",
        ctx.options().entry_points.join(", "),
        ctx.options().outdir_path().display()
    ));

    let result = ctx.rebuild()?;
    if !result.succeeded() {
        return Err(CliError::BuildFailed(failure_detail(&result)));
    }

    output.success("Production build complete!");
    Ok(())
}

fn failure_detail(result: &BuildResult) -> String {
    match result.exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd_build::{BuildError, BuildOptions};
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Bundler recording the options of every pass.
    struct RecordingBundler {
        exit_code: Option<i32>,
        passes: Mutex<Vec<BuildOptions>>,
    }

    impl RecordingBundler {
        fn new(exit_code: Option<i32>) -> Arc<Self> {
            Arc::new(Self {
                exit_code,
                passes: Mutex::new(Vec::new()),
            })
        }
    }

    impl Bundler for RecordingBundler {
        fn bundle(&self, options: &BuildOptions) -> Result<BuildResult, BuildError> {
            self.passes.lock().unwrap().push(options.clone());
            Ok(BuildResult {
                exit_code: self.exit_code,
                duration: Duration::from_millis(1),
            })
        }
    }

    fn config() -> Config {
        Config {
            project_dir: Path::new("/project").to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_each_run_is_one_minified_pass() {
        let bundler = RecordingBundler::new(Some(0));

        run(&config(), Arc::<RecordingBundler>::clone(&bundler)).unwrap();
        run(&config(), Arc::<RecordingBundler>::clone(&bundler)).unwrap();

        let passes = bundler.passes.lock().unwrap();
        assert_eq!(passes.len(), 2);
        assert!(passes.iter().all(|options| options.minify && !options.sourcemap));
    }

    #[test]
    fn test_failed_build_is_an_error() {
        let result = run(&config(), RecordingBundler::new(Some(1)));

        assert!(matches!(result, Err(CliError::BuildFailed(detail)) if detail == "exit code 1"));
    }

    #[test]
    fn test_failure_detail() {
        let exited = BuildResult {
            exit_code: Some(2),
            duration: Duration::ZERO,
        };
        let killed = BuildResult {
            exit_code: None,
            duration: Duration::ZERO,
        };

        assert_eq!(failure_detail(&exited), "exit code 2");
        assert_eq!(failure_detail(&killed), "terminated by signal");
    }
}

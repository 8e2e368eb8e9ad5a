//! Development mode: initial build, watchers, asset server, reload channel.

use hd_config::Config;
use hd_server::{DevServerConfig, run_dev_server};

use crate::error::CliError;
use crate::output::Output;

/// Run the dev server until interrupted.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub(crate) async fn execute(config: Config) -> Result<(), CliError> {
    let output = Output::new();

    output.highlight(&format!(
        "Serving {} at http://{}:{}",
        config.project_dir.display(),
        config.server.host,
        config.server.port
    ));
    output.info(&format!(
        "Reload channel: ws://{}:{}",
        config.server.host, config.live_reload.port
    ));
    output.info(&format!(
        "Watching: {}",
        config.live_reload.watch_patterns.join(", ")
    ));

    let server_config = DevServerConfig::from_config(&config)?;
    run_dev_server(server_config).await?;

    Ok(())
}

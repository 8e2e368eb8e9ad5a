//! Development server for the Hyperdeck dev harness.
//!
//! Runs two listeners side by side:
//! - the asset server, serving the project directory over HTTP
//! - the reload channel, a WebSocket listener whose clients receive the text
//!   message `reload` whenever something they display may have changed
//!
//! Two independent change sources drive the reload channel:
//! - the bundler's end-of-build hook ([`reload_on_build`]), which fires after
//!   each successful rebuild of the bundler's inputs
//! - a [`FileWatcher`] over configured globs, for files the bundler never sees
//!   (the HTML page itself)
//!
//! An edit to a file both sources see produces two reloads.
//!
//! # Architecture
//!
//! ```text
//! src/** ──► BuildContext::watch ──► reload_on_build ──┐
//!                                                      ├─► Notifier ──► ClientRegistry ──ws──► Browser
//! index.html, src/** ──► FileWatcher ──────────────────┘
//!
//! Browser ──HTTP──► asset server (static files from the project dir)
//! ```

mod app;
mod error;
mod live_reload;
mod middleware;
mod static_files;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hd_build::{
    BuildContext, BuildError, BuildMode, BuildOptions, Bundler, EsbuildCommand, Format,
};
use tokio::sync::watch;

pub use error::ServerError;
pub use live_reload::{
    BUILD_COMPLETE_REASON, ClientId, ClientRegistry, FileWatcher, Notifier, Notify, ReloadClient,
    ReloadServer, ReloadSignal, SendError, reload_on_build,
};

/// Dev server configuration.
#[derive(Clone, Debug)]
pub struct DevServerConfig {
    /// Host address both listeners bind to.
    pub host: String,
    /// Asset server port.
    pub port: u16,
    /// Reload channel port.
    pub reload_port: u16,
    /// Directory served as static files and watch root for `watch_patterns`.
    pub project_dir: PathBuf,
    /// Globs watched by the file change source.
    pub watch_patterns: Vec<String>,
    /// Quiet period before a burst of changes counts as one.
    pub debounce: Duration,
    /// Bundler program and leading arguments.
    pub bundler_command: Vec<String>,
    /// Development build options.
    pub build_options: BuildOptions,
    /// Bundler input directory watched for rebuilds.
    pub watch_dir: PathBuf,
}

/// Derive bundler options for `mode` from the project configuration.
///
/// # Errors
///
/// Returns an error if the configured format is unknown.
pub fn build_options_from_config(
    config: &hd_config::Config,
    mode: BuildMode,
) -> Result<BuildOptions, BuildError> {
    let build = &config.build;
    let format: Format = build.format.parse()?;

    let mut options = BuildOptions::for_mode(mode, &config.project_dir);
    options.entry_points.clone_from(&build.entry_points);
    options.outdir.clone_from(&build.outdir);
    options.format = format;
    // Code splitting is only supported for ES modules.
    options.splitting = build.splitting && format == Format::Esm;
    options.log_level.clone_from(&build.log_level);
    Ok(options)
}

/// Build context for `mode`.
///
/// In development the context reloads clients through `notifier` after each
/// successful pass. Production contexts never register the reload hook, even
/// when a notifier is supplied.
///
/// # Errors
///
/// Returns an error if the configured format is unknown.
pub fn build_context(
    config: &hd_config::Config,
    mode: BuildMode,
    bundler: Arc<dyn Bundler>,
    notifier: Option<Arc<dyn Notify>>,
) -> Result<BuildContext, BuildError> {
    let options = build_options_from_config(config, mode)?;
    let mut ctx = BuildContext::new(bundler, options);
    if let (BuildMode::Development, Some(notifier)) = (mode, notifier) {
        ctx.on_end(reload_on_build(notifier));
    }
    Ok(ctx)
}

impl DevServerConfig {
    /// Create dev server configuration from the project configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the build section cannot be turned into options.
    pub fn from_config(config: &hd_config::Config) -> Result<Self, BuildError> {
        Ok(Self {
            host: config.server.host.clone(),
            port: config.server.port,
            reload_port: config.live_reload.port,
            project_dir: config.project_dir.clone(),
            watch_patterns: config.live_reload.watch_patterns.clone(),
            debounce: Duration::from_millis(config.live_reload.debounce_ms),
            bundler_command: config.build.bundler.clone(),
            build_options: build_options_from_config(config, BuildMode::Development)?,
            watch_dir: config.build.watch_dir_in(&config.project_dir),
        })
    }

    /// Bind address for `port`; the host may be a name such as `localhost`.
    fn bind_addr(&self, port: u16) -> (&str, u16) {
        (self.host.as_str(), port)
    }
}

/// Run the dev server until Ctrl-C.
///
/// Binds the reload channel, runs an initial build, starts both change
/// sources, then serves assets and reload clients.
///
/// # Errors
///
/// Returns an error if a listener cannot be bound, the bundler cannot be
/// started, or a watch cannot be registered.
pub async fn run_dev_server(config: DevServerConfig) -> Result<(), ServerError> {
    let reload_server = ReloadServer::bind(config.bind_addr(config.reload_port)).await?;
    tracing::info!(url = %format!("ws://{}", reload_server.local_addr()?), "Reload channel ready");

    let notifier: Arc<dyn Notify> = Arc::new(Notifier::new(reload_server.registry()));

    // Change source A: bundler rebuilds
    let bundler = Arc::new(EsbuildCommand::new(config.bundler_command.clone())?);
    let mut ctx = BuildContext::new(bundler, config.build_options.clone());
    ctx.on_end(reload_on_build(Arc::clone(&notifier)));
    let ctx = Arc::new(ctx);

    let initial = Arc::clone(&ctx);
    tokio::task::spawn_blocking(move || initial.rebuild())
        .await
        .map_err(io::Error::other)??;
    let _build_watch = Arc::clone(&ctx).watch(&config.watch_dir, config.debounce)?;

    // Change source B: files outside the bundler's graph
    let mut file_watcher = FileWatcher::new(
        &config.project_dir,
        &config.watch_patterns,
        Arc::clone(&notifier),
    )?
    .with_debounce(config.debounce);
    file_watcher.start()?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr(config.port)).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Serving {}",
        config.project_dir.display()
    );

    let router = app::create_router(&config.project_dir);

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let assets =
        axum::serve(listener, router).with_graceful_shutdown(on_shutdown(shutdown_rx.clone()));
    tokio::try_join!(
        async move { assets.await },
        reload_server.serve_with_shutdown(on_shutdown(shutdown_rx)),
    )?;

    Ok(())
}

/// Resolves once shutdown has been requested.
fn on_shutdown(mut rx: watch::Receiver<()>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.changed().await;
    }
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

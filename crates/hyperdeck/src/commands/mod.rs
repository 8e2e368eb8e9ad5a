//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod dev;

use std::path::PathBuf;

use clap::Args;
use hd_config::{CliSettings, Config};

use crate::error::CliError;

/// Options shared by development and production runs.
#[derive(Args, Debug)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover hd.toml).
    #[arg(short, long, env = "HYPERDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Asset server port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Reload channel port (overrides config).
    #[arg(long)]
    reload_port: Option<u16>,
}

impl ConfigArgs {
    /// Load the project configuration with CLI overrides applied.
    pub(crate) fn load(self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            reload_port: self.reload_port,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

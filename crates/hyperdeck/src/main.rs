//! Hyperdeck CLI - front-end dev harness.
//!
//! Without flags, runs development mode: bundles the project, rebuilds and
//! reloads connected browsers on every change, and serves the project
//! directory. `--build` runs one production build instead.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::ConfigArgs;
use error::CliError;
use output::Output;

/// Hyperdeck - front-end dev harness with live reload.
#[derive(Parser)]
#[command(name = "hyperdeck", version, about)]
struct Cli {
    /// Run a single production build and exit.
    #[arg(long)]
    build: bool,

    /// Enable verbose output (debug logging).
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    config: ConfigArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to INFO
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(cli) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config.load()?;
    tracing::debug!(
        config_path = ?config.config_path,
        project_dir = %config.project_dir.display(),
        "Configuration loaded"
    );

    if cli.build {
        return commands::build::execute(&config);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(commands::dev::execute(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "hyperdeck",
            "--build",
            "--verbose",
            "--port",
            "8000",
            "--reload-port",
            "8001",
        ])
        .unwrap();

        assert!(cli.build);
        assert!(cli.verbose);
    }

    #[test]
    fn test_defaults_to_development() {
        let cli = Cli::try_parse_from(["hyperdeck"]).unwrap();

        assert!(!cli.build);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_port_must_be_numeric() {
        // Port 0 parses; validation happens when the config loads.
        assert!(Cli::try_parse_from(["hyperdeck", "--port", "0"]).is_ok());
        assert!(Cli::try_parse_from(["hyperdeck", "--port", "http"]).is_err());
    }
}

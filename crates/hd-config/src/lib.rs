//! Configuration management for the Hyperdeck dev harness.
//!
//! Parses `hd.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Without a config
//! file the defaults reproduce the stock harness: assets on port 3000, the
//! reload channel on port 3001, `src/main.js` and `src/styles.css` bundled
//! into `dist/`.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `build.bundler` (every element)

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override asset server port.
    pub port: Option<u16>,
    /// Override reload channel port.
    pub reload_port: Option<u16>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "hd.toml";

/// Output formats accepted by the bundler.
const FORMATS: &[&str] = &["esm", "iife", "cjs"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Asset server configuration.
    pub server: ServerConfig,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,
    /// Bundler configuration.
    pub build: BuildConfig,

    /// Project root: directory containing the config file, or the working
    /// directory when no file was found (set after loading).
    #[serde(skip)]
    pub project_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Asset server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Asset server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Port of the reload channel WebSocket server.
    pub port: u16,
    /// Glob patterns, relative to the project root, watched outside the
    /// bundler's own input graph. Brace groups (`*.{css,js}`) are allowed.
    pub watch_patterns: Vec<String>,
    /// Window in which raw events for one path count as a single change.
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            watch_patterns: vec![
                "index.html".to_owned(),
                "src/**/*.{css,js,ts,jsm,jsx}".to_owned(),
            ],
            debounce_ms: 100,
        }
    }
}

/// Bundler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Bundler program followed by leading arguments (e.g. `["npx", "esbuild"]`).
    pub bundler: Vec<String>,
    /// Entry points, relative to the project root.
    pub entry_points: Vec<String>,
    /// Output directory, relative to the project root.
    pub outdir: String,
    /// Output module format (`esm`, `iife` or `cjs`).
    pub format: String,
    /// Enable code splitting.
    pub splitting: bool,
    /// Bundler log level.
    pub log_level: String,
    /// Directory whose changes trigger a rebuild, relative to the project root.
    pub watch_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            bundler: vec!["esbuild".to_owned()],
            entry_points: vec!["src/main.js".to_owned(), "src/styles.css".to_owned()],
            outdir: "dist".to_owned(),
            format: "esm".to_owned(),
            splitting: true,
            log_level: "info".to_owned(),
            watch_dir: "src".to_owned(),
        }
    }
}

impl BuildConfig {
    /// Absolute path of the rebuild watch directory.
    #[must_use]
    pub fn watch_dir_in(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.watch_dir)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`DEV_HOST`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a port to be non-zero.
fn require_port(port: u16, field: &str) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::Validation(format!("{field} cannot be 0")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `hd.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. Validation runs last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(reload_port) = settings.reload_port {
            self.live_reload.port = reload_port;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config rooted at the current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config rooted at the given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            live_reload: LiveReloadConfig::default(),
            build: BuildConfig::default(),
            project_dir: base.to_path_buf(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    ///
    /// The path is made absolute first so a bare file name still yields a
    /// usable project directory.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path = std::path::absolute(path)?;
        let content = std::fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        config.project_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.config_path = Some(path);

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_live_reload()?;
        self.validate_build()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        require_port(self.server.port, "server.port")
    }

    fn validate_live_reload(&self) -> Result<(), ConfigError> {
        require_port(self.live_reload.port, "live_reload.port")?;

        if self.live_reload.port == self.server.port {
            return Err(ConfigError::Validation(format!(
                "live_reload.port must differ from server.port ({})",
                self.server.port
            )));
        }

        for pattern in &self.live_reload.watch_patterns {
            require_non_empty(pattern, "live_reload.watch_patterns")?;
        }

        Ok(())
    }

    fn validate_build(&self) -> Result<(), ConfigError> {
        let Some(program) = self.build.bundler.first() else {
            return Err(ConfigError::Validation(
                "build.bundler cannot be empty".to_owned(),
            ));
        };
        require_non_empty(program, "build.bundler")?;

        if self.build.entry_points.is_empty() {
            return Err(ConfigError::Validation(
                "build.entry_points cannot be empty".to_owned(),
            ));
        }
        require_non_empty(&self.build.outdir, "build.outdir")?;
        require_non_empty(&self.build.watch_dir, "build.watch_dir")?;

        if !FORMATS.contains(&self.build.format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "build.format must be one of {}, got '{}'",
                FORMATS.join(", "),
                self.build.format
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        for arg in &mut self.build.bundler {
            *arg = expand::expand_env(arg, "build.bundler")?;
        }

        Ok(())
    }
}

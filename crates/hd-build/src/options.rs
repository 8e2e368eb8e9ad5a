//! Build options and mode presets.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::BuildError;

/// Output module format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Esm,
    Iife,
    Cjs,
}

impl Format {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Esm => "esm",
            Self::Iife => "iife",
            Self::Cjs => "cjs",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "esm" => Ok(Self::Esm),
            "iife" => Ok(Self::Iife),
            "cjs" => Ok(Self::Cjs),
            other => Err(BuildError::UnknownFormat(other.to_owned())),
        }
    }
}

/// Development or production build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Source maps, no minification, live reload.
    Development,
    /// Minified, no source maps, single pass.
    Production,
}

impl BuildMode {
    /// Mode selected by the production switch.
    #[must_use]
    pub fn from_production_flag(production: bool) -> Self {
        if production {
            Self::Production
        } else {
            Self::Development
        }
    }

    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Inputs to one bundler pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Directory the bundler runs in; relative paths resolve against it.
    pub working_dir: PathBuf,
    /// Entry point files.
    pub entry_points: Vec<String>,
    /// Output directory.
    pub outdir: String,
    pub format: Format,
    /// Inline imported dependencies into the output.
    pub bundle: bool,
    /// Split shared code into chunks (requires `esm`).
    pub splitting: bool,
    pub sourcemap: bool,
    pub minify: bool,
    /// Bundler log level.
    pub log_level: String,
}

impl BuildOptions {
    /// Preset for the given mode, rooted at `working_dir`.
    #[must_use]
    pub fn for_mode(mode: BuildMode, working_dir: impl AsRef<Path>) -> Self {
        let production = mode.is_production();
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            entry_points: vec!["src/main.js".to_owned(), "src/styles.css".to_owned()],
            outdir: "dist".to_owned(),
            format: Format::Esm,
            bundle: true,
            splitting: true,
            sourcemap: !production,
            minify: production,
            log_level: "info".to_owned(),
        }
    }

    #[must_use]
    pub fn development(working_dir: impl AsRef<Path>) -> Self {
        Self::for_mode(BuildMode::Development, working_dir)
    }

    #[must_use]
    pub fn production(working_dir: impl AsRef<Path>) -> Self {
        Self::for_mode(BuildMode::Production, working_dir)
    }

    /// Absolute output directory.
    #[must_use]
    pub fn outdir_path(&self) -> PathBuf {
        self.working_dir.join(&self.outdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_development_preset() {
        let options = BuildOptions::development("/app");
        assert_eq!(options.working_dir, PathBuf::from("/app"));
        assert_eq!(options.entry_points, vec!["src/main.js", "src/styles.css"]);
        assert_eq!(options.outdir, "dist");
        assert_eq!(options.format, Format::Esm);
        assert!(options.bundle);
        assert!(options.splitting);
        assert!(options.sourcemap);
        assert!(!options.minify);
    }

    #[test]
    fn test_production_preset() {
        let options = BuildOptions::production("/app");
        assert!(!options.sourcemap);
        assert!(options.minify);
        assert_eq!(options.outdir_path(), PathBuf::from("/app/dist"));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(BuildMode::from_production_flag(true), BuildMode::Production);
        assert_eq!(BuildMode::from_production_flag(false), BuildMode::Development);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("esm".parse::<Format>().unwrap(), Format::Esm);
        assert_eq!("iife".parse::<Format>().unwrap(), Format::Iife);
        assert_eq!("cjs".parse::<Format>().unwrap(), Format::Cjs);
        assert!(matches!(
            "amd".parse::<Format>(),
            Err(BuildError::UnknownFormat(name)) if name == "amd"
        ));
    }
}

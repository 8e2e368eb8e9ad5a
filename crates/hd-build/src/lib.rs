//! Bundler pipeline for the Hyperdeck dev harness.
//!
//! The bundler itself is an external program (esbuild or anything accepting
//! the same flags). This crate decides how it is invoked and when:
//!
//! - [`BuildOptions`]: what to bundle, with development and production presets
//! - [`Bundler`]: one build pass; [`EsbuildCommand`] runs it as a subprocess
//! - [`BuildContext`]: runs passes and calls end-of-build hooks exactly once
//!   per completed pass
//! - [`BuildContext::watch`]: rebuilds when files under the input directory
//!   change
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hd_build::{BuildContext, BuildOptions, EsbuildCommand};
//!
//! let bundler = Arc::new(EsbuildCommand::new(vec!["esbuild".to_owned()])?);
//! let mut ctx = BuildContext::new(bundler, BuildOptions::development("."));
//! ctx.on_end(|result| println!("build finished: {}", result.succeeded()));
//! ctx.rebuild()?;
//! ```

mod bundler;
mod context;
mod error;
mod options;
mod watch;

pub use bundler::{BuildResult, Bundler, EsbuildCommand};
pub use context::{BuildContext, BuildHook};
pub use error::BuildError;
pub use options::{BuildMode, BuildOptions, Format};
pub use watch::WatchHandle;

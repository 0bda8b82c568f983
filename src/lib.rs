//! Falkor Bundler library
//!
//! Configuration derivation and build mode resolution for the bundler CLI.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod orchestrator;
pub mod utils;

pub use bundler::{Backend, BundleOptions, CommandBackend};
pub use cli::{ArgMap, ArgValue, Cli};
pub use config::{BuildPlan, CliConfig, PackageConfig, TsConfig};
pub use error::{Error, ValidationError};
pub use logger::{ConsoleLogger, Logger, MemoryLogger, SilentLogger};
pub use orchestrator::Orchestrator;

//! Error types
//!
//! Validators return [`ValidationError`]; the orchestrator wraps those and
//! backend failures into [`Error`]. Both map to a process status code.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ContextError;
use crate::logger::Logger;

/// Status code for every validation or bundling failure
pub const FAILURE_STATUS: u8 = 1;

/// A fatal problem found while deriving the build configuration
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("'{option}: {flag}' must be boolean, or already set (using argument: {value})")]
    BundleMode {
        option: &'static str,
        flag: String,
        value: String,
    },

    #[error("'{option}: {flag}' must be string (using argument: {value})")]
    NotAString {
        option: &'static str,
        flag: String,
        value: String,
    },

    #[error("'context: {flag}' parse error (using argument: {value}): {source}")]
    Context {
        flag: String,
        value: String,
        #[source]
        source: ContextError,
    },

    #[error("invalid entry point '{}'", .0.display())]
    InvalidEntryPoint(PathBuf),

    #[error("entry point '{}' not found", .0.display())]
    EntryPointNotFound(PathBuf),

    #[error("output subdirectory '{0}' is reserved, please consider restructuring your sources")]
    ReservedDirectory(String),

    #[error("invalid tsconfig.json ({reason}), working directory must be TypeScript project root")]
    InvalidTsConfig { reason: String },

    #[error("invalid package.json ({reason}), working directory must be NodeJS module root")]
    InvalidManifest { reason: String },

    #[error("'type' in package.json is not 'module' (found: {})", .0.as_deref().unwrap_or("nothing"))]
    ModuleType(Option<String>),

    #[error("'main' in package.json is not the same as 'module' (expected '{expected}', found: {})", .found.as_deref().unwrap_or("nothing"))]
    MainMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("'typings' in package.json is not named after 'module' (expected '{expected}', found: {})", .found.as_deref().unwrap_or("nothing"))]
    TypingsMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("nor 'binary' nor 'library' nor 'shared' build mode could be resolved from package.json")]
    NoBuildMode,

    #[error("invalid falkor.toml: {reason}")]
    InvalidSettings { reason: String },
}

impl ValidationError {
    pub fn status(&self) -> u8 {
        FAILURE_STATUS
    }

    /// Report through the logger and hand the error back for propagation
    pub(crate) fn report(self, logger: &dyn Logger) -> Self {
        logger.error(&self.to_string());
        self
    }
}

/// Failure of a whole invocation
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unhandled bundling error: {0:#}")]
    Backend(#[source] anyhow::Error),
}

impl Error {
    pub fn status(&self) -> u8 {
        match self {
            Error::Validation(err) => err.status(),
            Error::Backend(_) => FAILURE_STATUS,
        }
    }
}

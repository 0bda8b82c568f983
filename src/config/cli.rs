//! Command-line argument validation
//!
//! Turns tokenized arguments into a [`CliConfig`]. Keys are handled
//! independently of their order; the entry point is checked once all of
//! them have been applied.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::cli::{flag_name, ArgMap, ArgValue, EXTERNALS_KEY, POSITIONAL_KEY};
use crate::config::context::{self, CompilationContext, ContextValue};
use crate::error::ValidationError;
use crate::logger::Logger;
use crate::utils::{parse_path, FileSystem};

pub const DEFAULT_INPUT: &str = "src/index.ts";
pub const DEFAULT_OUT_DIR: &str = ".dist";

/// Release bundles are minified, debug bundles carry source maps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleMode {
    #[default]
    Release,
    Debug,
}

impl fmt::Display for BundleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleMode::Release => f.write_str("release"),
            BundleMode::Debug => f.write_str("debug"),
        }
    }
}

/// Build settings derived from the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Entry source file
    pub input: String,

    /// Directory part of `input`
    pub input_dir: String,

    /// File stem of `input`
    pub input_name: String,

    pub out_dir: String,

    /// Entry is JavaScript rather than TypeScript
    pub js_mode: bool,

    pub bundle_mode: BundleMode,

    /// Always holds `_DEBUG` and `_RELEASE`
    pub compilation_context: CompilationContext,

    /// Module specifiers kept out of the bundle
    pub outer_externals: Vec<String>,

    /// Sources of sibling shared targets, filled in by manifest validation
    pub shared_externals: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let mut config = Self {
            input: DEFAULT_INPUT.to_string(),
            input_dir: "src".to_string(),
            input_name: "index".to_string(),
            out_dir: DEFAULT_OUT_DIR.to_string(),
            js_mode: false,
            bundle_mode: BundleMode::Release,
            compilation_context: CompilationContext::new(),
            outer_externals: Vec::new(),
            shared_externals: Vec::new(),
        };
        config.set_bundle_mode(BundleMode::Release);
        config
    }
}

impl CliConfig {
    pub fn is_debug(&self) -> bool {
        self.bundle_mode == BundleMode::Debug
    }

    pub fn is_release(&self) -> bool {
        self.bundle_mode == BundleMode::Release
    }

    /// `{outDir}/{inputName}.js`, what the manifest must point at
    pub fn output_path(&self) -> String {
        format!("{}/{}.js", self.out_dir, self.input_name)
    }

    /// `{outDir}/{inputName}.d.ts`
    pub fn typings_path(&self) -> String {
        format!("{}/{}.d.ts", self.out_dir, self.input_name)
    }

    fn set_bundle_mode(&mut self, mode: BundleMode) {
        let debug = mode == BundleMode::Debug;
        self.bundle_mode = mode;
        self.compilation_context
            .insert("_DEBUG".to_string(), ContextValue::Bool(debug));
        self.compilation_context
            .insert("_RELEASE".to_string(), ContextValue::Bool(!debug));
    }
}

/// Validate tokenized arguments
///
/// `types_dir` is the subdirectory name reserved for intermediate
/// declaration output; it must not exist next to the entry file.
pub fn validate(
    args: &ArgMap,
    types_dir: &str,
    fs: &dyn FileSystem,
    logger: &dyn Logger,
) -> Result<CliConfig, ValidationError> {
    logger.task("validating command line arguments");

    let mut config = CliConfig::default();
    let mut bundle_mode_set = false;

    for (key, value) in args {
        match key.as_str() {
            "d" | "debug" | "r" | "release" => {
                let debug = matches!(key.as_str(), "d" | "debug");
                match value {
                    ArgValue::Bool(enabled) if !bundle_mode_set => {
                        let mode = if *enabled == debug {
                            BundleMode::Debug
                        } else {
                            BundleMode::Release
                        };
                        config.set_bundle_mode(mode);
                        bundle_mode_set = true;
                    }
                    _ => {
                        return Err(ValidationError::BundleMode {
                            option: if debug { "debug" } else { "release" },
                            flag: flag_name(key),
                            value: value.to_string(),
                        }
                        .report(logger))
                    }
                }
            }

            "i" | "input" => config.input = string_arg("input", key, value, logger)?,

            "o" | "out" => config.out_dir = string_arg("out", key, value, logger)?,

            "c" | "context" => {
                let raw = string_arg("context", key, value, logger)?;
                merge_context(&mut config.compilation_context, key, &raw, logger)?;
            }

            // consumed before validation to pick the logger
            "s" | "silent" => {}

            POSITIONAL_KEY => {}

            EXTERNALS_KEY => match value {
                ArgValue::List(items) => config
                    .outer_externals
                    .extend(items.iter().map(ToString::to_string)),
                other => config.outer_externals.push(other.to_string()),
            },

            _ => logger.warning(&format!(
                "unhandled CLI argument: '{}' ({})",
                flag_name(key),
                value
            )),
        }
    }

    let parts = parse_path(&config.input);
    match parts.ext.as_str() {
        ".js" => config.js_mode = true,
        ".ts" => {}
        _ => {
            let path = fs.absolute(Path::new(&config.input));
            return Err(ValidationError::InvalidEntryPoint(path).report(logger));
        }
    }

    if !fs.is_file(Path::new(&config.input)) {
        let path = fs.absolute(Path::new(&config.input));
        return Err(ValidationError::EntryPointNotFound(path).report(logger));
    }

    if fs.exists(&Path::new(&parts.dir).join(types_dir)) {
        return Err(ValidationError::ReservedDirectory(types_dir.to_string()).report(logger));
    }

    config.input_dir = parts.dir;
    config.input_name = parts.name;

    debug!(?config, "command line validated");

    Ok(config)
}

fn string_arg(
    option: &'static str,
    key: &str,
    value: &ArgValue,
    logger: &dyn Logger,
) -> Result<String, ValidationError> {
    match value {
        ArgValue::Str(s) => Ok(s.clone()),
        other => Err(ValidationError::NotAString {
            option,
            flag: flag_name(key),
            value: other.to_string(),
        }
        .report(logger)),
    }
}

fn merge_context(
    target: &mut CompilationContext,
    key: &str,
    raw: &str,
    logger: &dyn Logger,
) -> Result<(), ValidationError> {
    let parsed = context::parse(raw).map_err(|source| {
        ValidationError::Context {
            flag: flag_name(key),
            value: raw.to_string(),
            source,
        }
        .report(logger)
    })?;

    for discarded in &parsed.discarded {
        logger.warning(&format!("discarding excluded context key '{}'", discarded));
    }

    for (name, value) in parsed.values {
        target.insert(format!("_{}", name), value);
    }

    Ok(())
}

//! `package.json` validation and build mode classification
//!
//! A project is built as one or more of:
//! - **library**: `module` points at the current output, `main` and
//!   `typings` must agree with it
//! - **binary**: an entry of `bin` points at the current output
//! - **shared**: an entry of `shared` points at the current output
//!
//! Entries of `bin` and `shared` that belong to other targets are mapped
//! back to their sources, so declaration output and externals can skip them.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::cli::CliConfig;
use crate::config::schema::Manifest;
use crate::error::ValidationError;
use crate::logger::Logger;
use crate::utils::{js_to_ts, output_to_source, same_path, FileSystem};

pub const MANIFEST_FILE: &str = "package.json";

/// Kind of artifact a build produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Library,
    Binary,
    Shared,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Library => f.write_str("library"),
            BuildMode::Binary => f.write_str("binary"),
            BuildMode::Shared => f.write_str("shared"),
        }
    }
}

/// Build settings derived from the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageConfig {
    pub version: String,
    pub package_name: String,

    /// Binary command name or shared module name, may stay empty
    pub module_name: String,

    pub library_mode: bool,
    pub binary_mode: bool,
    pub shared_mode: bool,

    /// Resolved modes, always in library, binary, shared order
    pub build_modes: Vec<BuildMode>,

    /// Sources of other binary targets
    pub excluded_binaries: Vec<String>,
}

impl PackageConfig {
    /// `library & binary`
    pub fn modes_label(&self) -> String {
        self.build_modes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" & ")
    }

    /// `package` or `package:module` when the module name differs
    pub fn display_name(&self) -> String {
        if self.module_name.is_empty() || self.module_name == self.package_name {
            self.package_name.clone()
        } else {
            format!("{}:{}", self.package_name, self.module_name)
        }
    }
}

/// Read `package.json` and classify the build
///
/// Recomputes `cli.shared_externals` from the manifest's `shared` entries
/// that belong to other targets.
pub fn validate(
    cli: &mut CliConfig,
    fs: &dyn FileSystem,
    logger: &dyn Logger,
) -> Result<PackageConfig, ValidationError> {
    logger.task("validating package.json");

    let manifest = read(fs).map_err(|reason| ValidationError::InvalidManifest { reason }.report(logger))?;
    classify(&manifest, cli, logger)
}

fn read(fs: &dyn FileSystem) -> Result<Manifest, String> {
    let content = fs
        .read_to_string(Path::new(MANIFEST_FILE))
        .map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

/// Classification over an already parsed manifest
pub fn classify(
    manifest: &Manifest,
    cli: &mut CliConfig,
    logger: &dyn Logger,
) -> Result<PackageConfig, ValidationError> {
    let mut config = PackageConfig {
        version: manifest.version.clone().unwrap_or_default(),
        package_name: manifest.name.clone().unwrap_or_default(),
        ..PackageConfig::default()
    };

    match manifest.module_type.as_deref() {
        Some("module") => {}
        Some("commonjs") => logger.warning("'type' in package.json is 'commonjs'"),
        other => {
            return Err(ValidationError::ModuleType(other.map(str::to_string)).report(logger));
        }
    }

    let output = cli.output_path();

    if manifest.module.as_deref() == Some(output.as_str()) {
        if manifest.main.as_deref() != Some(output.as_str()) {
            return Err(ValidationError::MainMismatch {
                expected: output,
                found: manifest.main.clone(),
            }
            .report(logger));
        }
        let typings = cli.typings_path();
        if manifest.typings() != Some(typings.as_str()) {
            return Err(ValidationError::TypingsMismatch {
                expected: typings,
                found: manifest.typings().map(str::to_string),
            }
            .report(logger));
        }
        config.library_mode = true;
        config.build_modes.push(BuildMode::Library);
    }

    if let Some(bin) = &manifest.bin {
        for (name, path) in bin.entries(&config.package_name) {
            if path == output {
                config.module_name = name;
                if !config.binary_mode {
                    config.binary_mode = true;
                    config.build_modes.push(BuildMode::Binary);
                }
            } else {
                let source = to_source(&path, cli, true);
                if same_path(&source, &cli.input) {
                    debug!("bin '{}' resolves to the entry point, not excluded", name);
                    continue;
                }
                config.excluded_binaries.push(source);
            }
        }
    }

    let mut shared_externals = Vec::new();
    if let Some(shared) = &manifest.shared {
        for path in shared.paths() {
            if path == output {
                config.module_name = cli.input_name.clone();
                if !config.shared_mode {
                    config.shared_mode = true;
                    config.build_modes.push(BuildMode::Shared);
                }
            } else {
                let source = to_source(&path, cli, false);
                if same_path(&source, &cli.input) || same_path(&js_to_ts(&source), &cli.input) {
                    debug!("shared '{}' resolves to the entry point, not external", path);
                    continue;
                }
                if !cli.js_mode {
                    // imports may be written against either extension
                    shared_externals.push(source.clone());
                    shared_externals.push(js_to_ts(&source));
                } else {
                    shared_externals.push(source);
                }
            }
        }
    }
    cli.shared_externals = shared_externals;

    if config.build_modes.is_empty() {
        return Err(ValidationError::NoBuildMode.report(logger));
    }

    debug!(?config, shared_externals = ?cli.shared_externals, "package.json validated");

    Ok(config)
}

/// Output path of a sibling target rewritten into the source tree
fn to_source(path: &str, cli: &CliConfig, rename: bool) -> String {
    let source = output_to_source(path, &cli.out_dir, &cli.input_dir);
    if rename && !cli.js_mode {
        js_to_ts(&source)
    } else {
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::utils::MemoryFileSystem;
    use pretty_assertions::assert_eq;

    fn cli() -> CliConfig {
        CliConfig::default()
    }

    fn manifest(json: &str) -> Manifest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_library_mode() {
        let logger = MemoryLogger::new();
        let mut cli = cli();
        let config = classify(
            &manifest(
                r#"{"type": "module", "name": "pkg", "version": "1.0.0",
                    "module": ".dist/index.js", "main": ".dist/index.js",
                    "typings": ".dist/index.d.ts"}"#,
            ),
            &mut cli,
            &logger,
        )
        .unwrap();

        assert!(config.library_mode);
        assert!(!config.binary_mode && !config.shared_mode);
        assert_eq!(config.build_modes, vec![BuildMode::Library]);
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.package_name, "pkg");
        assert!(logger.errors().is_empty());
    }

    #[test]
    fn test_main_must_match_module() {
        let logger = MemoryLogger::new();
        let err = classify(
            &manifest(
                r#"{"type": "module", "module": ".dist/index.js", "main": "index.js",
                    "typings": ".dist/index.d.ts"}"#,
            ),
            &mut cli(),
            &logger,
        )
        .unwrap_err();

        assert!(matches!(err, ValidationError::MainMismatch { .. }));
        assert!(logger.errors()[0].contains("'main' in package.json is not the same as 'module'"));
    }

    #[test]
    fn test_typings_must_follow_module() {
        let logger = MemoryLogger::new();
        let err = classify(
            &manifest(
                r#"{"type": "module", "module": ".dist/index.js", "main": ".dist/index.js",
                    "typings": ".dist/types.d.ts"}"#,
            ),
            &mut cli(),
            &logger,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::TypingsMismatch { .. }));
    }

    #[test]
    fn test_binary_mode_excludes_siblings() {
        let logger = MemoryLogger::new();
        let mut cli = cli();
        let config = classify(
            &manifest(
                r#"{"type": "module", "name": "pkg",
                    "bin": {"foo": ".dist/index.js", "bar": "src/other.ts", "baz": ".dist/baz.js"}}"#,
            ),
            &mut cli,
            &logger,
        )
        .unwrap();

        assert!(config.binary_mode);
        assert_eq!(config.module_name, "foo");
        assert_eq!(config.build_modes, vec![BuildMode::Binary]);
        assert_eq!(config.excluded_binaries, vec!["src/other.ts", "src/baz.ts"]);
        assert_eq!(config.display_name(), "pkg:foo");
    }

    #[test]
    fn test_single_bin_is_named_after_package() {
        let mut cli = cli();
        let config = classify(
            &manifest(r#"{"type": "module", "name": "tool", "bin": ".dist/index.js"}"#),
            &mut cli,
            &MemoryLogger::new(),
        )
        .unwrap();

        assert_eq!(config.module_name, "tool");
        assert_eq!(config.display_name(), "tool");
    }

    #[test]
    fn test_js_mode_keeps_extensions() {
        let mut cli = CliConfig {
            input: "lib/index.js".into(),
            input_dir: "lib".into(),
            js_mode: true,
            ..cli()
        };
        let config = classify(
            &manifest(
                r#"{"type": "module", "bin": {"a": ".dist/index.js", "b": ".dist/b.js"},
                    "shared": ".dist/common.js"}"#,
            ),
            &mut cli,
            &MemoryLogger::new(),
        )
        .unwrap();

        assert_eq!(config.excluded_binaries, vec!["lib/b.js"]);
        assert_eq!(cli.shared_externals, vec!["lib/common.js"]);
    }

    #[test]
    fn test_shared_mode_and_shared_externals() {
        let mut cli = cli();
        let config = classify(
            &manifest(
                r#"{"type": "module", "name": "app",
                    "shared": [".dist/index.js", ".dist/util/common.js"]}"#,
            ),
            &mut cli,
            &MemoryLogger::new(),
        )
        .unwrap();

        assert!(config.shared_mode);
        assert_eq!(config.module_name, "index");
        assert_eq!(config.build_modes, vec![BuildMode::Shared]);
        assert_eq!(
            cli.shared_externals,
            vec!["src/util/common.js", "src/util/common.ts"]
        );
    }

    #[test]
    fn test_modes_combine_in_fixed_order() {
        let mut cli = cli();
        let config = classify(
            &manifest(
                r#"{"type": "module", "name": "pkg",
                    "shared": ".dist/index.js",
                    "bin": {"pkg": ".dist/index.js"},
                    "module": ".dist/index.js", "main": ".dist/index.js",
                    "typings": ".dist/index.d.ts"}"#,
            ),
            &mut cli,
            &MemoryLogger::new(),
        )
        .unwrap();

        assert_eq!(
            config.build_modes,
            vec![BuildMode::Library, BuildMode::Binary, BuildMode::Shared]
        );
        assert_eq!(config.modes_label(), "library & binary & shared");
    }

    #[test]
    fn test_entry_point_is_never_excluded() {
        let mut cli = cli();
        let config = classify(
            &manifest(
                r#"{"type": "module", "bin": {"self": "src/index.ts", "main": ".dist/index.js"},
                    "shared": [".dist/index.ts", "src/index.js"]}"#,
            ),
            &mut cli,
            &MemoryLogger::new(),
        )
        .unwrap();

        assert!(config.excluded_binaries.is_empty());
        assert!(cli.shared_externals.is_empty());
    }

    #[test]
    fn test_entry_point_match_ignores_dot_segments() {
        let mut cli = CliConfig {
            input: "./src/index.ts".into(),
            input_dir: "./src".into(),
            ..cli()
        };
        let config = classify(
            &manifest(
                r#"{"type": "module", "bin": {"a": ".dist/index.js", "self": "src/index.ts"},
                    "shared": ["src/./index.js", ".dist/lib.js"]}"#,
            ),
            &mut cli,
            &MemoryLogger::new(),
        )
        .unwrap();

        assert!(config.binary_mode);
        assert!(config.excluded_binaries.is_empty());
        assert_eq!(cli.shared_externals, vec!["./src/lib.js", "./src/lib.ts"]);
    }

    #[test]
    fn test_no_build_mode() {
        let logger = MemoryLogger::new();
        let err = classify(
            &manifest(r#"{"type": "module", "name": "pkg", "module": ".dist/other.js"}"#),
            &mut cli(),
            &logger,
        )
        .unwrap_err();

        assert!(matches!(err, ValidationError::NoBuildMode));
        assert_eq!(logger.errors().len(), 1);
    }

    #[test]
    fn test_module_type() {
        let logger = MemoryLogger::new();
        let mut cli = cli();
        classify(
            &manifest(r#"{"type": "commonjs", "bin": ".dist/index.js"}"#),
            &mut cli,
            &logger,
        )
        .unwrap();
        assert_eq!(logger.warnings(), vec!["'type' in package.json is 'commonjs'"]);

        let err = classify(&manifest(r#"{"bin": ".dist/index.js"}"#), &mut cli, &logger).unwrap_err();
        assert!(matches!(err, ValidationError::ModuleType(None)));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let fs = MemoryFileSystem::default().with_file(
            MANIFEST_FILE,
            r#"{"type": "module", "name": "app", "version": "0.1.0",
                "bin": {"app": ".dist/index.js", "other": ".dist/other.js"},
                "shared": ".dist/lib.js"}"#,
        );
        let logger = MemoryLogger::new();
        let mut cli = cli();

        let first = validate(&mut cli, &fs, &logger).unwrap();
        let first_shared = cli.shared_externals.clone();
        let second = validate(&mut cli, &fs, &logger).unwrap();

        assert_eq!(first, second);
        assert_eq!(cli.shared_externals, first_shared);
    }

    #[test]
    fn test_unreadable_manifest() {
        let logger = MemoryLogger::new();
        let fs = MemoryFileSystem::default().with_file(MANIFEST_FILE, "{");
        let err = validate(&mut cli(), &fs, &logger).unwrap_err();
        assert!(err.to_string().contains("working directory must be NodeJS module root"));

        let err = validate(&mut cli(), &MemoryFileSystem::default(), &logger).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidManifest { .. }));
    }
}

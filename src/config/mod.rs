//! Configuration handling
//!
//! Derives the build plan from the command line, `tsconfig.json` and
//! `package.json`, plus the tool's own optional `falkor.toml`.

pub mod cli;
pub mod context;
pub mod manifest;
mod schema;
pub mod tsconfig;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ValidationError;
use crate::utils::{quote_list, FileSystem};

pub use cli::{BundleMode, CliConfig};
pub use context::{CompilationContext, ContextError, ContextValue};
pub use manifest::{BuildMode, PackageConfig};
pub use schema::*;
pub use tsconfig::TsConfig;

pub const SETTINGS_FILE: &str = "falkor.toml";

/// Environment variable overriding `backend.command`
pub const BACKEND_ENV: &str = "FALKOR_BACKEND";

impl Settings {
    /// Load `falkor.toml` from the project root, defaults when absent
    pub fn load(fs: &dyn FileSystem) -> Result<Self, ValidationError> {
        let path = Path::new(SETTINGS_FILE);
        if !fs.is_file(path) {
            return Ok(Self::default());
        }

        let content = fs
            .read_to_string(path)
            .map_err(|e| ValidationError::InvalidSettings { reason: e.to_string() })?;
        toml::from_str(&content).map_err(|e| ValidationError::InvalidSettings {
            reason: e.to_string(),
        })
    }

    /// Apply a whitespace separated command line from the environment
    pub fn with_backend_override(mut self, command: Option<String>) -> Self {
        if let Some(command) = command {
            let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                self.backend.command = parts;
            }
        }
        self
    }
}

/// Everything the backend needs, assembled once per invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    pub working_dir: PathBuf,
    pub types_dir: String,
    pub cli: CliConfig,
    pub package: PackageConfig,
    pub ts: TsConfig,
}

impl BuildPlan {
    /// Outer externals followed by absolute shared externals
    pub fn externals(&self) -> Vec<String> {
        let shared = self
            .cli
            .shared_externals
            .iter()
            .map(|source| self.working_dir.join(source).display().to_string());

        self.cli.outer_externals.iter().cloned().chain(shared).collect()
    }

    /// Human-readable settings, one entry per log line
    pub fn summary(&self) -> Vec<String> {
        let cli = &self.cli;
        let mut lines = vec![
            format!("working directory: '{}'", self.working_dir.display()),
            format!(
                "input: '{}'{}",
                cli.input,
                if cli.js_mode { " (JS mode)" } else { "" }
            ),
            format!("out directory: '{}'", cli.out_dir),
        ];

        if !cli.outer_externals.is_empty() {
            lines.push(format!("externals: {}", quote_list(&cli.outer_externals)));
        }
        if !cli.shared_externals.is_empty() {
            lines.push(format!("shared externals: {}", quote_list(&cli.shared_externals)));
        }
        if !self.package.excluded_binaries.is_empty() {
            lines.push(format!(
                "excluded binary sources: {}",
                quote_list(&self.package.excluded_binaries)
            ));
        }

        let context = serde_json::to_string_pretty(&cli.compilation_context)
            .unwrap_or_else(|_| format!("{:?}", cli.compilation_context));
        lines.push(format!("build context: {}", context.replace('\n', "\n      ")));

        lines
    }

    /// `bundling library 'pkg' (1.0.0) in [release] mode`
    pub fn headline(&self) -> String {
        format!(
            "bundling {} '{}' ({}) in [{}] mode",
            self.package.modes_label(),
            self.package.display_name(),
            self.package.version,
            self.cli.bundle_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryFileSystem;
    use pretty_assertions::assert_eq;

    fn plan() -> BuildPlan {
        let mut cli = CliConfig::default();
        cli.outer_externals = vec!["fs".into()];
        cli.shared_externals = vec!["src/common.js".into(), "src/common.ts".into()];
        cli.compilation_context
            .insert("_FOO".into(), ContextValue::Str("bar".into()));

        BuildPlan {
            working_dir: PathBuf::from("/work"),
            types_dir: ".types".into(),
            cli,
            package: PackageConfig {
                version: "1.2.3".into(),
                package_name: "pkg".into(),
                module_name: "cli".into(),
                binary_mode: true,
                build_modes: vec![BuildMode::Binary],
                excluded_binaries: vec!["src/other.ts".into()],
                ..PackageConfig::default()
            },
            ts: TsConfig::default(),
        }
    }

    #[test]
    fn test_externals_append_absolute_shared_sources() {
        assert_eq!(
            plan().externals(),
            vec!["fs", "/work/src/common.js", "/work/src/common.ts"]
        );
    }

    #[test]
    fn test_summary_and_headline() {
        let plan = plan();
        let summary = plan.summary();

        assert_eq!(summary[0], "working directory: '/work'");
        assert_eq!(summary[1], "input: 'src/index.ts'");
        assert_eq!(summary[3], "externals: 'fs'");
        assert_eq!(summary[4], "shared externals: 'src/common.js', 'src/common.ts'");
        assert_eq!(summary[5], "excluded binary sources: 'src/other.ts'");
        assert!(summary[6].starts_with("build context: {"));
        assert!(summary[6].contains("\"_FOO\": \"bar\""));

        assert_eq!(plan.headline(), "bundling binary 'pkg:cli' (1.2.3) in [release] mode");
    }

    #[test]
    fn test_settings_file_and_env_override() {
        let fs = MemoryFileSystem::default();
        assert_eq!(Settings::load(&fs).unwrap(), Settings::default());

        let fs = fs.with_file(
            SETTINGS_FILE,
            "types_dir = \".tmp-types\"\n[backend]\ncommand = [\"node\", \"driver.mjs\"]\n",
        );
        let settings = Settings::load(&fs).unwrap();
        assert_eq!(settings.types_dir, ".tmp-types");
        assert_eq!(settings.backend.command, vec!["node", "driver.mjs"]);

        let settings = settings.with_backend_override(Some("rollup-driver --fast".into()));
        assert_eq!(settings.backend.command, vec!["rollup-driver", "--fast"]);
    }

    #[test]
    fn test_broken_settings_file() {
        let fs = MemoryFileSystem::default().with_file(SETTINGS_FILE, "types_dir = ");
        assert!(matches!(
            Settings::load(&fs),
            Err(ValidationError::InvalidSettings { .. })
        ));
    }
}

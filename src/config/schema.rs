//! Serde shapes of the documents the tool reads
//!
//! Fields that come in more than one JSON shape are modelled as untagged
//! enums and normalized before any classification runs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `package.json`, only the fields that drive classification
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(rename = "type", default)]
    pub module_type: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub main: Option<String>,

    #[serde(default)]
    pub typings: Option<String>,

    #[serde(default)]
    pub types: Option<String>,

    #[serde(default)]
    pub bin: Option<BinField>,

    #[serde(default)]
    pub shared: Option<SharedField>,
}

impl Manifest {
    /// `typings`, falling back to its `types` alias
    pub fn typings(&self) -> Option<&str> {
        self.typings.as_deref().or(self.types.as_deref())
    }
}

/// `bin`: a single path named after the package, or name to path
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Named(IndexMap<String, String>),
}

impl BinField {
    /// `(command name, path)` pairs in declaration order
    pub fn entries(&self, package_name: &str) -> Vec<(String, String)> {
        match self {
            BinField::Single(path) => vec![(package_name.to_string(), path.clone())],
            BinField::Named(map) => map
                .iter()
                .map(|(name, path)| (name.clone(), path.clone()))
                .collect(),
        }
    }
}

/// `shared`: one path or a list of paths
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SharedField {
    Single(String),
    Many(Vec<String>),
}

impl SharedField {
    pub fn paths(&self) -> Vec<String> {
        match self {
            SharedField::Single(path) => vec![path.clone()],
            SharedField::Many(paths) => paths.clone(),
        }
    }
}

/// `tsconfig.json`; `target`/`module` are read from `compilerOptions` and,
/// for older layouts, from the top level
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTsConfig {
    #[serde(default)]
    pub compiler_options: Option<RawCompilerOptions>,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub module: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompilerOptions {
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub module: Option<String>,
}

impl RawTsConfig {
    pub fn target(&self) -> Option<&str> {
        self.compiler_options
            .as_ref()
            .and_then(|o| o.target.as_deref())
            .or(self.target.as_deref())
    }

    pub fn module(&self) -> Option<&str> {
        self.compiler_options
            .as_ref()
            .and_then(|o| o.module.as_deref())
            .or(self.module.as_deref())
    }
}

/// `falkor.toml`, all optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Reserved intermediate declaration directory
    #[serde(default = "default_types_dir")]
    pub types_dir: String,

    /// External bundling driver
    #[serde(default)]
    pub backend: BackendSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            types_dir: default_types_dir(),
            backend: BackendSettings::default(),
        }
    }
}

fn default_types_dir() -> String {
    ".types".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Program followed by its arguments
    #[serde(default = "default_backend_command")]
    pub command: Vec<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            command: default_backend_command(),
        }
    }
}

fn default_backend_command() -> Vec<String> {
    vec!["falkor-rollup".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_shapes() {
        let single: Manifest = serde_json::from_str(r#"{"bin": "dist/cli.js"}"#).unwrap();
        assert_eq!(
            single.bin.unwrap().entries("pkg"),
            vec![("pkg".to_string(), "dist/cli.js".to_string())]
        );

        let named: Manifest =
            serde_json::from_str(r#"{"bin": {"zeta": "a.js", "alpha": "b.js"}}"#).unwrap();
        let names: Vec<String> = named.bin.unwrap().entries("pkg").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_shared_shapes() {
        let single: Manifest = serde_json::from_str(r#"{"shared": "a.js"}"#).unwrap();
        assert_eq!(single.shared.unwrap().paths(), vec!["a.js"]);

        let many: Manifest = serde_json::from_str(r#"{"shared": ["a.js", "b.js"]}"#).unwrap();
        assert_eq!(many.shared.unwrap().paths(), vec!["a.js", "b.js"]);
    }

    #[test]
    fn test_typings_alias() {
        let manifest: Manifest = serde_json::from_str(r#"{"types": "dist/index.d.ts"}"#).unwrap();
        assert_eq!(manifest.typings(), Some("dist/index.d.ts"));
    }

    #[test]
    fn test_tsconfig_layouts() {
        let nested: RawTsConfig =
            serde_json::from_str(r#"{"compilerOptions": {"target": "ES2020"}, "module": "ESNext"}"#).unwrap();
        assert_eq!(nested.target(), Some("ES2020"));
        assert_eq!(nested.module(), Some("ESNext"));
    }

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.types_dir, ".types");
        assert_eq!(settings.backend.command, vec!["falkor-rollup"]);
    }
}

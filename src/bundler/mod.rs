//! Bundling backend interface
//!
//! The actual transpile / bundle / minify / typings pipeline runs outside
//! this crate. [`BundleOptions`] is the single document handed to it.

mod command;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::config::manifest::MANIFEST_FILE;
use crate::config::{BuildPlan, CompilationContext};
use crate::logger::Logger;

pub use command::CommandBackend;

/// Banner prepended to binary bundles
pub const BINARY_BANNER: &str = "#!/usr/bin/env node";

/// ES module output for every bundle
pub const OUTPUT_FORMAT: &str = "es";

/// Something that can turn a plan into bundles
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    async fn bundle(&self, options: &BundleOptions, logger: &dyn Logger) -> Result<()>;
}

/// `false` or `"strict"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntrySignatures {
    Strict(&'static str),
    Off(bool),
}

impl EntrySignatures {
    pub const STRICT: Self = EntrySignatures::Strict("strict");
    pub const OFF: Self = EntrySignatures::Off(false);
}

/// Options for the whole backend pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleOptions {
    pub input: String,
    pub external: Vec<String>,
    /// Applied to both the javascript and the typings bundle
    pub node_externals: NodeExternalsOptions,
    pub preserve_entry_signatures: EntrySignatures,
    pub typescript: TypeScriptOptions,
    /// Map `.ts` imports of shared externals back to `.js`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_extensions: Option<RenameExtensionsOptions>,
    pub jscc: JsccOptions,
    pub minify: bool,
    pub output: OutputOptions,
    /// Flatten declarations into a single file, release libraries only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typings: Option<TypingsOptions>,
}

/// Dependencies listed in the manifest are never inlined
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExternalsOptions {
    pub package_path: &'static str,
    pub deps: bool,
}

impl Default for NodeExternalsOptions {
    fn default() -> Self {
        Self {
            package_path: MANIFEST_FILE,
            deps: true,
        }
    }
}

/// Compiler overrides, on top of the project's tsconfig.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeScriptOptions {
    pub exclude: Vec<String>,
    pub out_dir: String,
    pub target: String,
    pub module: String,
    pub root_dir: String,
    pub allow_js: bool,
    pub declaration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration_dir: Option<String>,
    pub declaration_map: bool,
    pub preserve_const_enums: bool,
    pub source_map: bool,
    pub always_strict: bool,
    /// Comments carry the jscc directives
    pub remove_comments: bool,
    pub es_module_interop: bool,
    pub allow_synthetic_default_imports: bool,
    pub force_consistent_casing_in_file_names: bool,
    pub no_implicit_returns: bool,
    pub no_implicit_any: bool,
    pub no_implicit_this: bool,
    pub no_unused_locals: bool,
    pub no_unused_parameters: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameExtensionsOptions {
    pub include: Vec<&'static str>,
    pub mappings: BTreeMap<&'static str, &'static str>,
    pub source_map: bool,
}

/// Compile-time conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsccOptions {
    pub values: CompilationContext,
    pub sourcemap: bool,
    pub map_content: bool,
    pub asloader: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    pub dir: String,
    pub format: &'static str,
    pub sourcemap: bool,
    pub sourcemap_exclude_sources: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingsOptions {
    /// Intermediate entry declaration
    pub input: String,
    /// Flattened declaration file
    pub file: String,
    pub format: &'static str,
    /// Intermediate directory removed after success
    pub temp_dir: String,
}

impl BundleOptions {
    pub fn from_plan(plan: &BuildPlan) -> Self {
        let cli = &plan.cli;
        let package = &plan.package;
        let debug = cli.is_debug();
        let temp_dir = format!("{}/{}", cli.out_dir, plan.types_dir);

        let declaration_dir = package.library_mode.then(|| {
            if debug {
                cli.out_dir.clone()
            } else {
                temp_dir.clone()
            }
        });

        let typings = (package.library_mode && cli.is_release()).then(|| TypingsOptions {
            input: format!("{}/{}.d.ts", temp_dir, cli.input_name),
            file: cli.typings_path(),
            format: OUTPUT_FORMAT,
            temp_dir: temp_dir.clone(),
        });

        let rename_extensions =
            (!cli.js_mode && !cli.shared_externals.is_empty()).then(|| RenameExtensionsOptions {
                include: vec!["**/*.ts"],
                mappings: BTreeMap::from([(".ts", ".js")]),
                source_map: debug,
            });

        Self {
            input: cli.input.clone(),
            external: plan.externals(),
            node_externals: NodeExternalsOptions::default(),
            preserve_entry_signatures: if package.library_mode || package.shared_mode {
                EntrySignatures::STRICT
            } else {
                EntrySignatures::OFF
            },
            typescript: TypeScriptOptions {
                exclude: package.excluded_binaries.clone(),
                out_dir: cli.out_dir.clone(),
                target: plan.ts.target.clone(),
                module: plan.ts.module.clone(),
                root_dir: cli.input_dir.clone(),
                allow_js: cli.js_mode,
                declaration: package.library_mode,
                declaration_dir,
                declaration_map: package.library_mode && debug,
                preserve_const_enums: debug,
                source_map: debug,
                always_strict: true,
                remove_comments: false,
                es_module_interop: true,
                allow_synthetic_default_imports: true,
                force_consistent_casing_in_file_names: true,
                no_implicit_returns: true,
                no_implicit_any: true,
                no_implicit_this: true,
                no_unused_locals: true,
                no_unused_parameters: true,
            },
            rename_extensions,
            jscc: JsccOptions {
                values: cli.compilation_context.clone(),
                sourcemap: debug,
                map_content: false,
                asloader: false,
            },
            minify: cli.is_release(),
            output: OutputOptions {
                dir: cli.out_dir.clone(),
                format: OUTPUT_FORMAT,
                sourcemap: debug,
                sourcemap_exclude_sources: true,
                banner: package.binary_mode.then_some(BINARY_BANNER),
            },
            typings,
        }
    }
}

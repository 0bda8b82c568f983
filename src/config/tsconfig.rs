//! `tsconfig.json` validation
//!
//! The document may carry comments and trailing commas, so it is read with
//! `json5`. A `target`/`module` other than `ESNext` is only a warning: the
//! project's own value is forwarded to the backend.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::schema::RawTsConfig;
use crate::error::ValidationError;
use crate::logger::Logger;
use crate::utils::FileSystem;

pub const TSCONFIG_FILE: &str = "tsconfig.json";

/// Baseline for both `target` and `module`
pub const EXPECTED_ES_VERSION: &str = "ESNext";

/// Effective compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TsConfig {
    pub target: String,
    pub module: String,
}

impl Default for TsConfig {
    fn default() -> Self {
        Self {
            target: EXPECTED_ES_VERSION.to_string(),
            module: EXPECTED_ES_VERSION.to_string(),
        }
    }
}

/// Read and validate `tsconfig.json` from the project root
pub fn validate(fs: &dyn FileSystem, logger: &dyn Logger) -> Result<TsConfig, ValidationError> {
    logger.task("validating tsconfig.json");

    let raw = read(fs).map_err(|reason| ValidationError::InvalidTsConfig { reason }.report(logger))?;

    let config = TsConfig {
        target: effective("target", raw.target(), logger),
        module: effective("module", raw.module(), logger),
    };

    debug!(?config, "tsconfig validated");

    Ok(config)
}

fn read(fs: &dyn FileSystem) -> Result<RawTsConfig, String> {
    let content = fs
        .read_to_string(Path::new(TSCONFIG_FILE))
        .map_err(|e| e.to_string())?;
    json5::from_str(&content).map_err(|e| e.to_string())
}

fn effective(option: &str, declared: Option<&str>, logger: &dyn Logger) -> String {
    match declared {
        Some(value) if value.eq_ignore_ascii_case(EXPECTED_ES_VERSION) => value.to_string(),
        Some(value) => {
            logger.warning(&format!(
                "'{}' in tsconfig.json is not '{}', but '{}'",
                option, EXPECTED_ES_VERSION, value
            ));
            value.to_string()
        }
        None => {
            logger.warning(&format!(
                "'{}' in tsconfig.json is not set, assuming '{}'",
                option, EXPECTED_ES_VERSION
            ));
            EXPECTED_ES_VERSION.to_string()
        }
    }
}

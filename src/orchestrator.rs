//! Build plan assembly
//!
//! Runs the three validators in order, prints the resolved settings and
//! hands the plan to the backend. Only the caller decides how to exit.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::bundler::{Backend, BundleOptions};
use crate::cli::ArgMap;
use crate::config::{self, BuildPlan};
use crate::error::{Error, ValidationError};
use crate::logger::Logger;
use crate::utils::{format_duration, FileSystem};

pub const DEFAULT_TYPES_DIR: &str = ".types";

pub struct Orchestrator<'a> {
    fs: &'a dyn FileSystem,
    logger: &'a dyn Logger,
    backend: &'a dyn Backend,
    types_dir: String,
}

impl<'a> Orchestrator<'a> {
    pub fn new(fs: &'a dyn FileSystem, logger: &'a dyn Logger, backend: &'a dyn Backend) -> Self {
        Self {
            fs,
            logger,
            backend,
            types_dir: DEFAULT_TYPES_DIR.to_string(),
        }
    }

    /// Override the reserved intermediate declaration directory
    pub fn with_types_dir(mut self, types_dir: impl Into<String>) -> Self {
        self.types_dir = types_dir.into();
        self
    }

    /// Validate everything and assemble the plan, without bundling
    pub fn plan(&self, args: &ArgMap) -> Result<BuildPlan, ValidationError> {
        let mut cli = config::cli::validate(args, &self.types_dir, self.fs, self.logger)?;
        let ts = config::tsconfig::validate(self.fs, self.logger)?;
        let package = config::manifest::validate(&mut cli, self.fs, self.logger)?;

        Ok(BuildPlan {
            working_dir: self.fs.root().to_path_buf(),
            types_dir: self.types_dir.clone(),
            cli,
            package,
            ts,
        })
    }

    /// Validate, report and bundle
    pub async fn run(&self, args: &ArgMap) -> Result<BuildPlan, Error> {
        self.logger.banner("starting");

        let plan = self.plan(args)?;

        self.logger.task("validated settings");
        for line in plan.summary() {
            self.logger.log(&line);
        }

        self.logger.task(&plan.headline());

        let options = BundleOptions::from_plan(&plan);
        let start = Instant::now();
        info!(backend = self.backend.name(), "bundling");

        if let Err(err) = self.backend.bundle(&options, self.logger).await {
            self.logger.error("unhandled bundling error:");
            self.logger.log(&format!("{:#}", err));
            return Err(Error::Backend(err));
        }

        if let Some(typings) = &options.typings {
            self.logger.log(&format!(
                "removing intermediate typings files from '{}'",
                plan.types_dir
            ));
            self.remove_temp_dir(&typings.temp_dir)?;
        }

        self.logger
            .log(&format!("bundled in {}", format_duration(start.elapsed())));
        self.logger.banner("finished");

        Ok(plan)
    }

    fn remove_temp_dir(&self, dir: &str) -> Result<(), Error> {
        match self.fs.remove_dir_all(Path::new(dir)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no intermediate typings at '{}'", dir);
                Ok(())
            }
            Err(e) => {
                let err = anyhow::Error::new(e).context(format!("Failed to remove '{}'", dir));
                self.logger.error(&format!("{:#}", err));
                Err(Error::Backend(err))
            }
        }
    }
}

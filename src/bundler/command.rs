//! Backend that drives an external program
//!
//! The program receives [`BundleOptions`] as JSON on stdin and reports
//! success through its exit status. Its own output is passed through.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{Backend, BundleOptions};
use crate::logger::Logger;

#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandBackend {
    /// `command` is the program followed by its arguments
    pub fn new(command: &[String], working_dir: impl Into<PathBuf>) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("Backend command is empty");
        };

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: working_dir.into(),
        })
    }
}

#[async_trait]
impl Backend for CommandBackend {
    fn name(&self) -> &str {
        &self.program
    }

    async fn bundle(&self, options: &BundleOptions, logger: &dyn Logger) -> Result<()> {
        let payload =
            serde_json::to_vec_pretty(options).context("Failed to serialize bundle options")?;

        logger.log(&format!("handing bundle options to '{}'", self.program));
        debug!(program = %self.program, args = ?self.args, "spawning backend");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start bundling backend '{}'", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload).await {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("backend closed stdin before reading the options");
                }
                result => result.context("Failed to write bundle options to backend")?,
            }
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for bundling backend '{}'", self.program))?;

        if !status.success() {
            bail!("Bundling backend '{}' exited with {}", self.program, status);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_is_rejected() {
        assert!(CommandBackend::new(&[], ".").is_err());

        let backend = CommandBackend::new(&["node".into(), "driver.mjs".into()], ".").unwrap();
        assert_eq!(backend.name(), "node");
        assert_eq!(backend.args, vec!["driver.mjs"]);
    }
}

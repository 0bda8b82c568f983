//! Command-line interface for Falkor Bundler
//!
//! clap parses argv; the result is flattened into an [`ArgMap`] so the
//! validator sees plain key/value pairs.

mod args;

use std::process::ExitCode;

use clap::{ArgAction, CommandFactory, Parser};
use tracing::debug;

pub use args::{flag_name, ArgMap, ArgValue, EXTERNALS_KEY, POSITIONAL_KEY};

use crate::bundler::CommandBackend;
use crate::config::{Settings, BACKEND_ENV};
use crate::error::FAILURE_STATUS;
use crate::logger::{ConsoleLogger, Logger, SilentLogger};
use crate::orchestrator::Orchestrator;
use crate::utils::{FileSystem, OsFileSystem};

const CONTEXT_HELP: &str = "\
JSCC Context:
  A space delimited string that uses '#' prefix for variables when parsed. Eg. \"#VALUE #KEY example\"
  will extend the compilation context with { _VALUE: true, _KEY: \"example\" } after parsed.

  If for some reason the '#' character is reserved in your workflow, it can be substituted with any
  special character starting the value with the ':<special-char> ' sequence, eg. \":$ $VALUE $KEY example\".";

/// Opinionated ES6 JavaScript / TypeScript module bundler
#[derive(Parser, Debug)]
#[command(name = "falkor-bundler")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true, after_help = CONTEXT_HELP)]
pub struct Cli {
    /// Show version and exit
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Bundle in release mode, only used for readability [default]
    #[arg(short, long, action = ArgAction::Count)]
    pub release: u8,

    /// Bundle in debug mode
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Do not print messages
    #[arg(short, long)]
    pub silent: bool,

    /// Entry .ts or .js file [default: src/index.ts]
    #[arg(short, long, value_name = "FILE", action = ArgAction::Append)]
    pub input: Vec<String>,

    /// Output directory of bundle [default: .dist]
    #[arg(short, long, value_name = "DIR", action = ArgAction::Append)]
    pub out: Vec<String>,

    /// JSCC compilation context (see below)
    #[arg(short, long, value_name = "CTX", action = ArgAction::Append)]
    pub context: Vec<String>,

    /// Positional arguments, ignored
    #[arg(hide = true)]
    pub positional: Vec<String>,

    /// Treat all arguments after double dash as externals
    #[arg(last = true, value_name = "EXTERNALS")]
    pub externals: Vec<String>,

    /// Flags clap does not know, kept for the validator to warn about
    #[arg(skip)]
    pub unknown: Vec<(String, ArgValue)>,
}

impl From<&Cli> for ArgMap {
    fn from(cli: &Cli) -> Self {
        let mut args = ArgMap::new();
        let mut insert = |key: &str, value: Option<ArgValue>| {
            if let Some(value) = value {
                args.insert(key.to_string(), value);
            }
        };

        insert("release", ArgValue::from_count(cli.release));
        insert("debug", ArgValue::from_count(cli.debug));
        insert("silent", cli.silent.then_some(ArgValue::Bool(true)));
        insert("input", ArgValue::from_strings(&cli.input));
        insert("out", ArgValue::from_strings(&cli.out));
        insert("context", ArgValue::from_strings(&cli.context));
        insert(POSITIONAL_KEY, Some(ArgValue::list(&cli.positional)));
        insert(EXTERNALS_KEY, Some(ArgValue::list(&cli.externals)));

        for (key, value) in &cli.unknown {
            match args.get_mut(key) {
                Some(ArgValue::List(items)) => items.push(value.clone()),
                Some(existing) => *existing = ArgValue::List(vec![existing.clone(), value.clone()]),
                None => {
                    args.insert(key.clone(), value.clone());
                }
            }
        }

        args
    }
}

impl Cli {
    /// Parse argv; help and version exit 0, other parse errors exit 1
    pub fn parse_or_exit() -> Self {
        let argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
        match Self::try_parse_lenient(argv) {
            Ok(cli) => cli,
            Err(err) => {
                let _ = err.print();
                let code = if err.use_stderr() { FAILURE_STATUS as i32 } else { 0 };
                std::process::exit(code);
            }
        }
    }

    /// Like `try_parse_from`, but unknown flags are set aside instead of rejected
    ///
    /// `--key` and `-k` become `true`, `--key=value` becomes a string. Values
    /// of known options and everything after `--` are left to clap.
    pub fn try_parse_lenient<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (known, unknown) = split_unknown(argv.into_iter().map(Into::into));
        let mut cli = Self::try_parse_from(known)?;
        cli.unknown = unknown;
        Ok(cli)
    }

    pub fn logger(&self) -> Box<dyn Logger> {
        if self.silent {
            Box::new(SilentLogger)
        } else {
            Box::new(ConsoleLogger)
        }
    }

    /// Run one invocation in the current working directory
    pub async fn execute(&self) -> ExitCode {
        let logger = self.logger();
        let logger = logger.as_ref();

        let fs = match OsFileSystem::current_dir() {
            Ok(fs) => fs,
            Err(err) => {
                logger.error(&format!("cannot determine working directory: {}", err));
                return ExitCode::from(FAILURE_STATUS);
            }
        };

        let settings = match Settings::load(&fs) {
            Ok(settings) => settings.with_backend_override(std::env::var(BACKEND_ENV).ok()),
            Err(err) => return ExitCode::from(err.report(logger).status()),
        };
        debug!(?settings, "settings loaded");

        let backend = match CommandBackend::new(&settings.backend.command, fs.root()) {
            Ok(backend) => backend,
            Err(err) => {
                logger.error(&format!("{:#}", err));
                return ExitCode::from(FAILURE_STATUS);
            }
        };

        let args = ArgMap::from(self);
        let result = Orchestrator::new(&fs, logger, &backend)
            .with_types_dir(settings.types_dir)
            .run(&args)
            .await;

        match result {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => ExitCode::from(err.status()),
        }
    }
}

/// Separate argv into tokens clap accepts and unknown flags
fn split_unknown(argv: impl Iterator<Item = String>) -> (Vec<String>, Vec<(String, ArgValue)>) {
    let command = Cli::command();
    let long_takes_value = |name: &str| -> Option<bool> {
        if name == "help" {
            return Some(false);
        }
        command
            .get_arguments()
            .find(|arg| arg.get_long() == Some(name))
            .map(|arg| arg.get_action().takes_values())
    };
    let short_takes_value = |c: char| -> Option<bool> {
        if c == 'h' {
            return Some(false);
        }
        command
            .get_arguments()
            .find(|arg| arg.get_short() == Some(c))
            .map(|arg| arg.get_action().takes_values())
    };

    let mut known = Vec::new();
    let mut unknown = Vec::new();
    let mut argv = argv;

    // binary name
    known.extend(argv.next());

    while let Some(token) = argv.next() {
        if token == "--" {
            known.push(token);
            known.extend(argv.by_ref());
            break;
        }

        if let Some(long) = token.strip_prefix("--") {
            let (name, attached) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            match long_takes_value(name) {
                Some(takes_value) => {
                    let needs_next = takes_value && attached.is_none();
                    known.push(token.clone());
                    if needs_next {
                        known.extend(argv.next());
                    }
                }
                None => {
                    let value = attached.map_or(ArgValue::Bool(true), |v| ArgValue::Str(v.to_string()));
                    unknown.push((name.to_string(), value));
                }
            }
            continue;
        }

        let Some(group) = token.strip_prefix('-').filter(|g| !g.is_empty()) else {
            known.push(token);
            continue;
        };

        let mut kept = String::new();
        let mut needs_next = false;
        for (i, c) in group.char_indices() {
            match short_takes_value(c) {
                Some(true) => {
                    kept.push(c);
                    let rest = &group[i + c.len_utf8()..];
                    kept.push_str(rest);
                    needs_next = rest.is_empty();
                    break;
                }
                Some(false) => kept.push(c),
                None => unknown.push((c.to_string(), ArgValue::Bool(true))),
            }
        }
        if !kept.is_empty() {
            known.push(format!("-{}", kept));
            if needs_next {
                known.extend(argv.next());
            }
        }
    }

    (known, unknown)
}

//! Reporting capability used by the validators and the orchestrator
//!
//! The core never prints directly; everything user-facing goes through a
//! [`Logger`] so that `--silent` and tests can swap the sink.

use colored::Colorize;
use parking_lot::Mutex;

/// Four-severity reporting interface
pub trait Logger: Send + Sync {
    /// A top-level step, e.g. "validating package.json"
    fn task(&self, message: &str);

    /// Detail within the current step
    fn log(&self, message: &str);

    /// Non-fatal problem, processing continues
    fn warning(&self, message: &str);

    /// Fatal problem, the caller is about to fail
    fn error(&self, message: &str);

    /// Tool banner line. Defaults to a task.
    fn banner(&self, message: &str) {
        self.task(message);
    }
}

/// Colored terminal output
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn task(&self, message: &str) {
        println!("  {} {}", "#".cyan(), message.bold());
    }

    fn log(&self, message: &str) {
        println!("    {} {}", ">".dimmed(), message);
    }

    fn warning(&self, message: &str) {
        println!("    {} {}", "! WARNING:".yellow().bold(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("    {} {}", "! ERROR:".red().bold(), message);
    }

    fn banner(&self, message: &str) {
        println!("{} {}", "[Falkor Bundler]".cyan().bold(), message);
    }
}

/// Discards everything (`--silent`)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentLogger;

impl Logger for SilentLogger {
    fn task(&self, _message: &str) {}
    fn log(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn banner(&self, _message: &str) {}
}

/// Severity of a recorded entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Task,
    Log,
    Warning,
    Error,
}

/// Records every entry in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries in order
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().clone()
    }

    /// Messages recorded with the given severity
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Severity::Warning)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    fn push(&self, severity: Severity, message: &str) {
        self.entries.lock().push((severity, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn task(&self, message: &str) {
        self.push(Severity::Task, message);
    }

    fn log(&self, message: &str) {
        self.push(Severity::Log, message);
    }

    fn warning(&self, message: &str) {
        self.push(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(Severity::Error, message);
    }
}

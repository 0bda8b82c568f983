//! Utility functions and helpers

mod fs;

pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};

use std::path::Path;

/// Directory, file stem and extension of a `/`-separated path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    pub dir: String,
    pub name: String,
    /// Including the leading dot, empty when absent
    pub ext: String,
}

/// Split a path the way package.json entries are written
pub fn parse_path(path: &str) -> PathParts {
    let path = Path::new(path);
    let dir = path
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    PathParts { dir, name, ext }
}

/// First directory of a path, keeping a leading `./`
///
/// `./.dist/bin/x` -> `./.dist`, `src/lib` -> `src`, `` -> ``
pub fn top_level_dir(path: &str) -> &str {
    let prefix = if path.starts_with("./") { 2 } else { 0 };
    let segment = path[prefix..].split('/').next().unwrap_or("");
    &path[..prefix + segment.len()]
}

/// Move a path from the output directory tree into the source tree
///
/// Only the top-level directory is swapped, since shared and binary targets
/// may live below the root of either tree. Paths outside `out_dir` are
/// returned unchanged.
pub fn output_to_source(path: &str, out_dir: &str, input_dir: &str) -> String {
    let from = top_level_dir(out_dir);
    let to = top_level_dir(input_dir);

    let rest = match path.strip_prefix(from) {
        Some(rest) if !from.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
        _ => return path.to_string(),
    };

    if to.is_empty() {
        rest.trim_start_matches('/').to_string()
    } else {
        format!("{}{}", to, rest)
    }
}

/// Clean a path by removing `.` and `..` components
///
/// `./src/../src/index.ts` -> `src/index.ts`
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }

    if path.starts_with('/') {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    }
}

/// Whether two relative paths name the same file once cleaned
pub fn same_path(a: &str, b: &str) -> bool {
    clean_path(a) == clean_path(b)
}

/// Swap a trailing `.js` for `.ts`
pub fn js_to_ts(path: &str) -> String {
    match path.strip_suffix(".js") {
        Some(stem) => format!("{}.ts", stem),
        None => path.to_string(),
    }
}

/// `'a', 'b', 'c'` for log lines
pub fn quote_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}

//! Compilation context mini-language
//!
//! A space delimited string where marker-prefixed tokens are keys:
//! `"#VALUE #KEY example"` yields `VALUE = true` and `KEY = "example"`.
//! The marker defaults to `#` and may be substituted by starting the string
//! with `:<char> `, e.g. `":$ $VALUE $KEY example"`.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

/// Default key marker
pub const DEFAULT_MARKER: char = '#';

/// Keys that may never be set from the command line
pub const RESERVED_KEYS: &[&str] = &["DEBUG", "RELEASE", "_", "__", "--"];

static MARKER_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:(.) ").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Value of a compile-time condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Str(String),
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Bool(b) => write!(f, "{}", b),
            ContextValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Condition name (underscore-prefixed) to value
pub type CompilationContext = BTreeMap<String, ContextValue>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("'{0}' cannot be used as context marker")]
    InvalidMarker(char),
}

/// Result of parsing a context string
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedContext {
    /// Accepted keys in the order they appeared, without prefix
    pub values: Vec<(String, ContextValue)>,
    /// Reserved keys that were dropped
    pub discarded: Vec<String>,
}

/// Parse a context string
pub fn parse(input: &str) -> Result<ParsedContext, ContextError> {
    let (marker, body) = match MARKER_HEADER.captures(input) {
        Some(caps) => {
            let header = caps.get(0).map_or(0, |m| m.end());
            let marker = caps[1].chars().next().unwrap_or(DEFAULT_MARKER);
            (marker, &input[header..])
        }
        None => (DEFAULT_MARKER, input),
    };

    if marker.is_alphanumeric() || marker.is_whitespace() || marker == '-' || marker == '_' {
        return Err(ContextError::InvalidMarker(marker));
    }

    let tokens: Vec<&str> = WHITESPACE.split(body).filter(|t| !t.is_empty()).collect();
    let mut parsed = ParsedContext::default();
    let mut index = 0;

    while index < tokens.len() {
        let token = tokens[index];
        index += 1;

        let Some(key) = token.strip_prefix(marker) else {
            trace!("ignoring positional context token '{}'", token);
            continue;
        };

        let (key, value) = if let Some((key, value)) = key.split_once('=') {
            (key, ContextValue::Str(value.to_string()))
        } else if let Some(negated) = key.strip_prefix("no-").filter(|k| !k.is_empty()) {
            (negated, ContextValue::Bool(false))
        } else {
            match tokens.get(index) {
                Some(next) if !next.starts_with(marker) => {
                    index += 1;
                    (key, scalar(next))
                }
                _ => (key, ContextValue::Bool(true)),
            }
        };

        // a lone marker is the separator artifact
        let key = if key.is_empty() { "--" } else { key };

        if RESERVED_KEYS.contains(&key) {
            parsed.discarded.push(key.to_string());
            continue;
        }

        match parsed.values.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => parsed.values.push((key.to_string(), value)),
        }
    }

    Ok(parsed)
}

fn scalar(token: &str) -> ContextValue {
    match token {
        "true" => ContextValue::Bool(true),
        "false" => ContextValue::Bool(false),
        other => ContextValue::Str(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(parsed: &ParsedContext) -> Vec<(&str, ContextValue)> {
        parsed
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect()
    }

    #[test]
    fn test_flags_and_strings() {
        let parsed = parse("#FOO #BAR baz").unwrap();
        assert_eq!(
            pairs(&parsed),
            vec![
                ("FOO", ContextValue::Bool(true)),
                ("BAR", ContextValue::Str("baz".into())),
            ]
        );
        assert!(parsed.discarded.is_empty());
    }

    #[test]
    fn test_substituted_marker() {
        let parsed = parse(":$ $VALUE $KEY #example").unwrap();
        assert_eq!(
            pairs(&parsed),
            vec![
                ("VALUE", ContextValue::Bool(true)),
                ("KEY", ContextValue::Str("#example".into())),
            ]
        );
    }

    #[test]
    fn test_extended_forms() {
        let parsed = parse("  #A=1 #no-B #C false #D true  ").unwrap();
        assert_eq!(
            pairs(&parsed),
            vec![
                ("A", ContextValue::Str("1".into())),
                ("B", ContextValue::Bool(false)),
                ("C", ContextValue::Bool(false)),
                ("D", ContextValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn test_reserved_keys_are_discarded() {
        let parsed = parse("#DEBUG #RELEASE yes # #_ #OK").unwrap();
        assert_eq!(pairs(&parsed), vec![("OK", ContextValue::Bool(true))]);
        assert_eq!(parsed.discarded, vec!["DEBUG", "RELEASE", "--", "_"]);
    }

    #[test]
    fn test_last_value_wins() {
        let parsed = parse("#MODE a #MODE b").unwrap();
        assert_eq!(pairs(&parsed), vec![("MODE", ContextValue::Str("b".into()))]);
    }

    #[test]
    fn test_invalid_marker() {
        assert_eq!(parse(":x xFOO"), Err(ContextError::InvalidMarker('x')));
        assert_eq!(parse(":- -FOO"), Err(ContextError::InvalidMarker('-')));
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(parse("").unwrap(), ParsedContext::default());
    }
}

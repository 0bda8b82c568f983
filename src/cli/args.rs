//! Tokenized command-line input
//!
//! The core consumes a key to value mapping instead of raw argv, so the
//! validator does not care which tokenizer produced it.

use std::collections::BTreeMap;
use std::fmt;

/// Key holding positional arguments
pub const POSITIONAL_KEY: &str = "_";

/// Key holding everything after the `--` separator
pub const EXTERNALS_KEY: &str = "--";

/// A single tokenized value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Bool(bool),
    Str(String),
    /// Repeated option or list-valued key
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// `Str` for a single occurrence, `List` for repeats, `None` when absent
    pub fn from_strings(values: &[String]) -> Option<Self> {
        match values {
            [] => None,
            [single] => Some(ArgValue::Str(single.clone())),
            many => Some(ArgValue::List(
                many.iter().cloned().map(ArgValue::Str).collect(),
            )),
        }
    }

    /// `Bool(true)` for a single occurrence, `List` for repeats
    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(ArgValue::Bool(true)),
            n => Some(ArgValue::List(vec![ArgValue::Bool(true); n as usize])),
        }
    }

    pub fn list(values: &[String]) -> Self {
        ArgValue::List(values.iter().cloned().map(ArgValue::Str).collect())
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::List(items) => {
                let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

/// Tokenized arguments, iterated in key order
pub type ArgMap = BTreeMap<String, ArgValue>;

/// `--name` for long keys, `-n` for short ones
pub fn flag_name(key: &str) -> String {
    if key.chars().count() > 1 {
        format!("--{}", key)
    } else {
        format!("-{}", key)
    }
}

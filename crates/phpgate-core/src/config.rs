//! Hook configuration.
//!
//! A [`Config`] starts from built-in defaults and is overlaid with the
//! assignments found in an optional override file. The file uses the
//! `KEY=value` shell syntax of the hook script it replaces, so existing
//! `config` files keep working:
//!
//! ```text
//! # run only the PSR-2 ruleset
//! PHPCS_CODING_STANDARD="PSR2"
//! export PHPMD_ACTIVE=0
//! ```
//!
//! Nothing is validated beyond compiling the two path patterns. Unknown keys
//! are ignored and missing keys keep their default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::GateError;

/// Name of the override file looked up next to the hook executable.
pub const CONFIG_FILE_NAME: &str = "config";

/// The only value that turns an analyzer on.
pub const ENABLED: &str = "1";

const DEFAULTS: &[(&str, &str)] = &[
    ("PHPCS_ACTIVE", "1"),
    ("PHPCS_BIN", "/usr/bin/phpcs"),
    ("PHPCS_CODING_STANDARD", "PEAR"),
    ("PHPCS_IGNORE", ""),
    ("PHPCS_SNIFFS", ""),
    ("PHPCS_ENCODING", "utf-8"),
    ("PHPCS_IGNORE_WARNINGS", "1"),
    ("PHPMD_ACTIVE", "1"),
    ("PHPMD_BIN", "/usr/bin/phpmd"),
    ("PHPMD_OUTPUT", "text"),
    (
        "PHPMD_PATTERNS_LIST",
        "cleancode,codesize,controversial,design,naming,unusedcode",
    ),
    ("PHPMD_SUFFIXES", ""),
    ("PHPMD_EXCLUDE", ""),
    ("FILE_PATTERN", r"\.(php|phtml)$"),
    ("EXCLUDE_PATTERN", ""),
    ("TMP_STAGING", ".tmp_staging"),
];

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)=(.*)$").unwrap()
});

/// Settings for PHP_CodeSniffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnifferConfig {
    pub active: bool,
    pub bin: PathBuf,
    pub coding_standard: String,
    pub ignore: String,
    pub sniffs: String,
    pub encoding: String,
    pub ignore_warnings: bool,
}

/// Settings for PHP Mess Detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessDetectorConfig {
    pub active: bool,
    pub bin: PathBuf,
    pub output: String,
    pub patterns_list: String,
    pub suffixes: String,
    pub exclude: String,
}

/// Fully resolved hook configuration. Built once, then only borrowed.
#[derive(Debug, Clone)]
pub struct Config {
    pub phpcs: CodeSnifferConfig,
    pub phpmd: MessDetectorConfig,
    /// Paths must match this (unanchored search) to be inspected.
    pub file_pattern: Regex,
    /// Paths matching this are dropped before `file_pattern` is applied.
    pub exclude_pattern: Option<Regex>,
    /// Scratch root. Relative values are resolved against the repository top level.
    pub staging_dir: PathBuf,
}

impl Config {
    /// Defaults overlaid with the assignments in `source`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Regex`] if `FILE_PATTERN` or `EXCLUDE_PATTERN`
    /// does not compile.
    pub fn from_source(source: &str) -> Result<Self, GateError> {
        let mut values: BTreeMap<&str, String> = DEFAULTS
            .iter()
            .map(|(key, value)| (*key, value.to_string()))
            .collect();

        for (key, value) in parse_assignments(source) {
            match values.get_mut(key.as_str()) {
                Some(slot) => *slot = value,
                None => debug!(key = %key, "ignoring unknown config key"),
            }
        }

        Self::resolve(&values)
    }

    /// Loads the override file at `path`, falling back to the defaults when
    /// no path is given or the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Io`] if the file exists but cannot be read, or
    /// [`GateError::Regex`] if a pattern does not compile.
    pub fn load(path: Option<&Path>) -> Result<Self, GateError> {
        match path {
            Some(p) if p.is_file() => {
                debug!(path = %p.display(), "loading config overrides");
                let source = std::fs::read_to_string(p)?;
                Self::from_source(&source)
            }
            Some(p) => {
                debug!(path = %p.display(), "no config file, using defaults");
                Self::from_source("")
            }
            None => Self::from_source(""),
        }
    }

    /// Location of the override file: `config` next to the running executable.
    pub fn sibling_path() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join(CONFIG_FILE_NAME))
    }

    fn resolve(values: &BTreeMap<&str, String>) -> Result<Self, GateError> {
        let get = |key: &str| values.get(key).cloned().unwrap_or_default();
        let flag = |key: &str| values.get(key).is_some_and(|v| v == ENABLED);

        let exclude = get("EXCLUDE_PATTERN");
        let exclude_pattern = if exclude.is_empty() {
            None
        } else {
            Some(Regex::new(&exclude)?)
        };

        Ok(Self {
            phpcs: CodeSnifferConfig {
                active: flag("PHPCS_ACTIVE"),
                bin: PathBuf::from(get("PHPCS_BIN")),
                coding_standard: get("PHPCS_CODING_STANDARD"),
                ignore: get("PHPCS_IGNORE"),
                sniffs: get("PHPCS_SNIFFS"),
                encoding: get("PHPCS_ENCODING"),
                ignore_warnings: flag("PHPCS_IGNORE_WARNINGS"),
            },
            phpmd: MessDetectorConfig {
                active: flag("PHPMD_ACTIVE"),
                bin: PathBuf::from(get("PHPMD_BIN")),
                output: get("PHPMD_OUTPUT"),
                patterns_list: get("PHPMD_PATTERNS_LIST"),
                suffixes: get("PHPMD_SUFFIXES"),
                exclude: get("PHPMD_EXCLUDE"),
            },
            file_pattern: Regex::new(&get("FILE_PATTERN"))?,
            exclude_pattern,
            staging_dir: PathBuf::from(get("TMP_STAGING")),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        // The built-in patterns are known to compile.
        Self::from_source("").expect("default config is valid")
    }
}

/// Parses `KEY=value` lines. Comments, blank lines and anything that is not
/// an assignment are skipped.
pub fn parse_assignments(source: &str) -> Vec<(String, String)> {
    let mut assignments = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(caps) = ASSIGNMENT_RE.captures(line) else {
            warn!(line = idx + 1, content = %line, "skipping unparseable config line");
            continue;
        };

        assignments.push((caps[1].to_string(), unquote(&caps[2])));
    }

    assignments
}

fn unquote(raw: &str) -> String {
    let value = raw.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }

    // Bare value: a `#` preceded by whitespace starts a comment.
    let end = value
        .char_indices()
        .find(|&(i, c)| c == '#' && i > 0 && value[..i].ends_with(char::is_whitespace))
        .map_or(value.len(), |(i, _)| i);
    value[..end].trim_end().to_string()
}

//! Configuration types for scanning and caching.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default maximum depth below the root.
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Default maximum number of directories collected per root.
pub const DEFAULT_MAX_DIRS: usize = 5000;

/// Default cache time-to-live in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Directory names that are never descended into.
pub const BUILTIN_SKIP_DIRS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Dependencies
    "node_modules",
    "vendor",
    ".npm",
    ".yarn",
    "venv",
    ".venv",
    "env",
    ".env",
    ".tox",
    // Build artifacts
    "target",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "coverage",
    // Caches
    "__pycache__",
    ".cache",
    ".mypy_cache",
    ".pytest_cache",
    // IDE/Editor
    ".idea",
    ".vscode",
];

/// Parameters that shape a scan. A cached record is only reused when it was
/// produced with the same parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanParams {
    /// Deepest level visited, the root itself is depth 0.
    pub max_depth: usize,

    /// Maximum number of directories collected.
    pub max_entries: usize,

    /// Directory names (case-sensitive) whose subtrees are pruned.
    pub skip_dirs: BTreeSet<String>,

    /// Whether directories starting with `.` are indexed.
    #[serde(default)]
    pub include_hidden: bool,
}

impl ScanParams {
    /// Create scan parameters with the built-in skip set.
    pub fn new(max_depth: usize, max_entries: usize) -> Self {
        Self {
            max_depth,
            max_entries,
            skip_dirs: BUILTIN_SKIP_DIRS.iter().map(|name| (*name).to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Add a directory name to the skip set.
    pub fn skip(mut self, name: impl Into<String>) -> Self {
        self.skip_dirs.insert(name.into());
        self
    }

    /// Index hidden directories too.
    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Check if a directory with this name should be pruned.
    pub fn prunes(&self, name: &str) -> bool {
        self.skip_dirs.contains(name) || (!self.include_hidden && name.starts_with('.'))
    }
}

impl Default for ScanParams {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_DIRS)
    }
}

/// Everything the scan and cache layers read from the environment.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Scan parameters.
    pub scan: ScanParams,

    /// How long a cached record stays valid.
    pub ttl: Duration,

    /// Directory holding cache records.
    pub cache_dir: PathBuf,

    /// Workspace roots, in configured order.
    pub workspaces: Vec<PathBuf>,
}

impl IndexSettings {
    pub const MAX_DEPTH_VAR: &'static str = "DONGLE_MAX_DEPTH";
    pub const MAX_DIRS_VAR: &'static str = "DONGLE_MAX_DIRS";
    pub const CACHE_TTL_VAR: &'static str = "DONGLE_CACHE_TTL";
    pub const SKIP_DIRS_VAR: &'static str = "DONGLE_SKIP_DIRS";
    pub const SHOW_HIDDEN_VAR: &'static str = "DONGLE_SHOW_HIDDEN";
    pub const WORKSPACES_VAR: &'static str = "DONGLE_WORKSPACES";
    pub const CACHE_DIR_VAR: &'static str = "DONGLE_CACHE_DIR";

    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup, so callers and tests can
    /// supply variables without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_depth = parse_or(&lookup, Self::MAX_DEPTH_VAR, DEFAULT_MAX_DEPTH);
        let max_entries = parse_or(&lookup, Self::MAX_DIRS_VAR, DEFAULT_MAX_DIRS);
        let ttl_secs = parse_or(&lookup, Self::CACHE_TTL_VAR, DEFAULT_CACHE_TTL_SECS);

        let mut scan = ScanParams::new(max_depth, max_entries)
            .with_hidden(lookup(Self::SHOW_HIDDEN_VAR).is_some_and(|v| is_truthy(&v)));
        if let Some(extra) = lookup(Self::SKIP_DIRS_VAR) {
            scan.skip_dirs.extend(split_names(&extra));
        }

        let workspaces = lookup(Self::WORKSPACES_VAR)
            .map(|value| {
                std::env::split_paths(&value)
                    .filter(|path| !path.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cache_dir = lookup(Self::CACHE_DIR_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);

        Self {
            scan,
            ttl: Duration::from_secs(ttl_secs),
            cache_dir,
            workspaces,
        }
    }
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring {key}={raw:?}: not a non-negative integer");
            default
        }),
        _ => default,
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Split a list of directory names separated by commas, colons or whitespace.
fn split_names(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(|c: char| c == ',' || c == ':' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("dongle"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".dongle_cache")))
        .unwrap_or_else(|| std::env::temp_dir().join("dongle"))
}

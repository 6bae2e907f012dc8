//! Directory tree scanning.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanParams;
use crate::error::{IndexError, Result};

/// A directory found by a scan, as path segments relative to the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexEntry {
    segments: Vec<String>,
}

impl IndexEntry {
    /// Create an entry from root-relative segments.
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The root-relative path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Depth below the root. Direct children of the root are at depth 1.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The relative path joined with `/`.
    pub fn display(&self) -> String {
        self.segments.join("/")
    }

    /// Absolute path of this entry under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

/// The ordered result of scanning one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryIndex {
    root: PathBuf,
    created_at: i64,
    params: ScanParams,
    entries: Vec<IndexEntry>,
}

impl DirectoryIndex {
    /// Create an index stamped with the current time.
    pub fn new(root: impl Into<PathBuf>, params: ScanParams, entries: Vec<IndexEntry>) -> Self {
        Self::restore(root, Utc::now().timestamp(), params, entries)
    }

    /// Rebuild an index with a known creation time.
    pub(crate) fn restore(
        root: impl Into<PathBuf>,
        created_at: i64,
        params: ScanParams,
        entries: Vec<IndexEntry>,
    ) -> Self {
        Self {
            root: root.into(),
            created_at,
            params,
            entries,
        }
    }

    /// Absolute path of the scanned root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creation time in epoch seconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Parameters the index was produced with.
    pub(crate) fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Entries in scan order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters collected while scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Directories collected.
    pub directories: usize,

    /// Subtrees skipped because they could not be read.
    pub unreadable: usize,

    /// Whether a limit cut the scan short.
    pub truncated: bool,

    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// An index together with how it was produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub index: DirectoryIndex,
    pub stats: ScanStats,
}

/// Walks a root collecting directories.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    params: ScanParams,
    time_budget: Option<Duration>,
}

impl Scanner {
    /// Create a scanner.
    pub fn new(params: ScanParams) -> Self {
        Self {
            params,
            time_budget: None,
        }
    }

    /// Stop walking once `budget` has elapsed, keeping what was found.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Scan `root` and collect every directory within the limits.
    ///
    /// Symbolic links to directories are recorded but never followed.
    /// Unreadable subtrees are skipped. Hitting `max_entries` or the time
    /// budget yields a prefix of the full traversal, not an error.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome> {
        let root = canonical_root(root)?;
        let start = Instant::now();
        let params = &self.params;
        let mut entries = Vec::new();
        let mut stats = ScanStats::default();

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .min_depth(1)
            .max_depth(params.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || self.admits(entry));

        for item in walker {
            if self.time_budget.is_some_and(|budget| start.elapsed() >= budget) {
                debug!("Scan of {} ran out of time", root.display());
                stats.truncated = true;
                break;
            }

            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("Skipping unreadable subtree: {err}");
                    stats.unreadable += 1;
                    continue;
                }
            };

            if entries.len() >= params.max_entries {
                stats.truncated = true;
                break;
            }

            if let Some(entry) = relative_entry(&root, entry.path()) {
                entries.push(entry);
            }
        }

        let duration = start.elapsed();
        stats.directories = entries.len();
        stats.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        info!(
            "Scanned {} directories under {} in {:?} (unreadable: {}, truncated: {})",
            stats.directories,
            root.display(),
            duration,
            stats.unreadable,
            stats.truncated
        );

        Ok(ScanOutcome {
            index: DirectoryIndex::new(root, params.clone(), entries),
            stats,
        })
    }

    /// Whether a walked entry is a directory worth indexing.
    fn admits(&self, entry: &DirEntry) -> bool {
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        if self.params.prunes(name) {
            return false;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return true;
        }
        // A link to a directory is a leaf: walkdir does not descend into it.
        file_type.is_symlink() && entry.path().metadata().is_ok_and(|m| m.is_dir())
    }
}

/// Scan `root` with `params`.
pub fn scan(root: &Path, params: &ScanParams) -> Result<DirectoryIndex> {
    Scanner::new(params.clone()).scan(root).map(|outcome| outcome.index)
}

/// Resolve `root` to the canonical absolute directory used as a cache key.
pub fn canonical_root(root: &Path) -> Result<PathBuf> {
    let canonical = std::fs::canonicalize(root)
        .map_err(|e| IndexError::invalid_root(root, e.to_string()))?;
    if !canonical.is_dir() {
        return Err(IndexError::invalid_root(root, "not a directory"));
    }
    Ok(canonical)
}

fn relative_entry(root: &Path, path: &Path) -> Option<IndexEntry> {
    let relative = path.strip_prefix(root).ok()?;
    let segments = relative
        .components()
        .map(|component| match component {
            Component::Normal(name) => name.to_str().map(str::to_string),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(IndexEntry::new(segments))
}

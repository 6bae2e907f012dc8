//! On-disk cache of directory indexes.
//!
//! Each root gets one JSON record under `<cache dir>/index/`, named by the
//! SHA-256 of the canonical root path. Records are replaced by writing a
//! temporary file in the same directory and renaming it over the old one, so
//! concurrent readers see either the previous record or the new one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::ScanParams;
use crate::error::{IndexError, Result};
use crate::scanner::{DirectoryIndex, IndexEntry, ScanOutcome, Scanner, canonical_root};

/// Persisted form of a [`DirectoryIndex`].
///
/// `entries` stays loosely typed until [`normalize_entry`] has turned every
/// element into path segments.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    root: String,
    created_at: i64,
    ttl_seconds: u64,
    scan: ScanParams,
    entries: Vec<Value>,
}

impl CacheRecord {
    fn from_index(index: &DirectoryIndex, ttl: Duration) -> Self {
        Self {
            root: index.root().to_string_lossy().into_owned(),
            created_at: index.created_at(),
            ttl_seconds: ttl.as_secs(),
            scan: index.params().clone(),
            entries: index
                .entries()
                .iter()
                .map(|entry| {
                    Value::Array(
                        entry
                            .segments()
                            .iter()
                            .map(|segment| Value::String(segment.clone()))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Result of looking up a root in the cache.
#[derive(Debug)]
pub enum Lookup {
    /// A valid record was found.
    Hit(DirectoryIndex),

    /// The root has to be scanned.
    Miss(MissReason),
}

/// Why a lookup missed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// No record exists for the root.
    Absent,

    /// The record is older than its time-to-live.
    Expired,

    /// The record was produced with different scan parameters.
    ParamsChanged,

    /// The record belongs to a different root.
    RootMismatch,

    /// The record could not be read or parsed.
    Corrupt(String),
}

/// Cache of directory indexes keyed by canonical root.
#[derive(Debug, Clone)]
pub struct IndexCache {
    /// Directory holding one record per root.
    dir: PathBuf,
}

impl IndexCache {
    /// Create a cache rooted at `cache_dir`. Nothing is touched on disk until
    /// the first write.
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: cache_dir.as_ref().join("index"),
        }
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for a canonical root.
    pub fn record_path(&self, root: &Path) -> PathBuf {
        let digest = Sha256::digest(root.as_os_str().as_encoded_bytes());
        self.dir.join(format!("{digest:x}.json"))
    }

    /// Look up `root`, which must already be canonical.
    pub fn load(&self, root: &Path, ttl: Duration, params: &ScanParams) -> Lookup {
        self.load_at(root, ttl, params, Utc::now().timestamp())
    }

    fn load_at(&self, root: &Path, ttl: Duration, params: &ScanParams, now: i64) -> Lookup {
        let path = self.record_path(root);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Lookup::Miss(MissReason::Absent),
            Err(e) => return Lookup::Miss(MissReason::Corrupt(e.to_string())),
        };

        let record: CacheRecord = match serde_json::from_slice(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!("Discarding unreadable cache record {}: {e}", path.display());
                return Lookup::Miss(MissReason::Corrupt(e.to_string()));
            }
        };

        if record.root != root.to_string_lossy() {
            return Lookup::Miss(MissReason::RootMismatch);
        }
        if &record.scan != params {
            return Lookup::Miss(MissReason::ParamsChanged);
        }

        let ttl_seconds = record.ttl_seconds.min(ttl.as_secs());
        let age = now - record.created_at;
        if age < 0 || age.unsigned_abs() >= ttl_seconds {
            return Lookup::Miss(MissReason::Expired);
        }

        let total = record.entries.len();
        let entries: Vec<IndexEntry> = record.entries.iter().filter_map(normalize_entry).collect();
        if entries.len() != total {
            warn!(
                "Dropped {} malformed entries from cache record {}",
                total - entries.len(),
                path.display()
            );
        }

        Lookup::Hit(DirectoryIndex::restore(
            root,
            record.created_at,
            record.scan,
            entries,
        ))
    }

    /// Write `index` as the record for its root, replacing any previous one.
    pub fn store(&self, index: &DirectoryIndex, ttl: Duration) -> Result<PathBuf> {
        let path = self.record_path(index.root());
        let write_err = |source| IndexError::CacheWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        let content = serde_json::to_vec(&CacheRecord::from_index(index, ttl))?;
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        temp.write_all(&content).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&path).map_err(|e| write_err(e.error))?;

        debug!("Saved {} entries for {} to {}", index.len(), index.root().display(), path.display());
        Ok(path)
    }

    /// Return the cached index for `root`, scanning and storing a fresh one
    /// when the record is missing, stale or unreadable.
    pub fn get_or_scan(&self, root: &Path, ttl: Duration, params: &ScanParams) -> Result<DirectoryIndex> {
        let root = canonical_root(root)?;
        match self.load(&root, ttl, params) {
            Lookup::Hit(index) => {
                debug!("Cache hit for {} ({} entries)", root.display(), index.len());
                Ok(index)
            }
            Lookup::Miss(reason) => {
                debug!("Cache miss for {}: {reason:?}", root.display());
                self.refresh(&root, ttl, &Scanner::new(params.clone()))
            }
        }
    }

    /// Scan `root` and store the result. A failed write is logged, the fresh
    /// index is still returned.
    pub fn refresh(&self, root: &Path, ttl: Duration, scanner: &Scanner) -> Result<DirectoryIndex> {
        let ScanOutcome { index, .. } = scanner.scan(root)?;
        if let Err(e) = self.store(&index, ttl) {
            warn!("{e}");
        }
        Ok(index)
    }

    /// Scan `root` and store the result, failing if the record cannot be
    /// written.
    pub fn warm(&self, root: &Path, ttl: Duration, scanner: &Scanner) -> Result<ScanOutcome> {
        let outcome = scanner.scan(root)?;
        let path = self.store(&outcome.index, ttl)?;
        info!(
            "Warmed cache for {} ({} entries) at {}",
            outcome.index.root().display(),
            outcome.index.len(),
            path.display()
        );
        Ok(outcome)
    }

    /// Remove the record for `root`. Returns whether a record existed.
    ///
    /// Roots that no longer exist are keyed by their absolute path.
    pub fn invalidate(&self, root: &Path) -> Result<bool> {
        let root = match canonical_root(root) {
            Ok(root) => root,
            Err(_) => std::path::absolute(root)?,
        };
        let path = self.record_path(&root);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Invalidated cache record for {}", root.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every record. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        info!("Cleared {removed} cache records");
        Ok(removed)
    }
}

/// Turn one persisted entry into path segments.
///
/// Accepts an array of strings, a `/`-joined string, or an object keyed by
/// consecutive indices (`{"0": "a", "1": "b"}`). Anything else, and any entry
/// that would escape the root, is rejected.
fn normalize_entry(raw: &Value) -> Option<IndexEntry> {
    let segments: Vec<String> = match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<_>>()?,
        Value::String(joined) => joined.split('/').map(str::to_string).collect(),
        Value::Object(map) => {
            let mut indexed = map
                .iter()
                .map(|(key, value)| Some((key.parse::<usize>().ok()?, value.as_str()?)))
                .collect::<Option<Vec<_>>>()?;
            indexed.sort_unstable_by_key(|(position, _)| *position);
            if indexed.iter().enumerate().any(|(i, (position, _))| i != *position) {
                return None;
            }
            indexed.into_iter().map(|(_, segment)| segment.to_string()).collect()
        }
        _ => return None,
    };

    let valid = !segments.is_empty()
        && segments
            .iter()
            .all(|s| !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\0']));
    valid.then(|| IndexEntry::new(segments))
}

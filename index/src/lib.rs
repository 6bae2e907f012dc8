//! # Dongle Index
//!
//! This crate turns a directory tree into a flat, cacheable list of
//! root-relative directory paths.
//!
//! ## Features
//!
//! - **Bounded Scans**: depth, entry-count and time limits truncate instead of failing
//! - **Skip Lists**: version-control, dependency and build-output directories are pruned
//! - **Persistent Cache**: one JSON record per root with a time-to-live
//! - **Atomic Writes**: records are replaced by rename, readers never see a torn file
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Dongle Index                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  IndexSettings ──► Scanner ──► DirectoryIndex                   │
//! │       │                             │                           │
//! │       ▼                             ▼                           │
//! │   ScanParams               IndexCache (record per root)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod scanner;

pub use cache::{IndexCache, Lookup, MissReason};
pub use config::{BUILTIN_SKIP_DIRS, IndexSettings, ScanParams};
pub use error::{IndexError, Result};
pub use scanner::{DirectoryIndex, IndexEntry, ScanOutcome, ScanStats, Scanner, canonical_root, scan};

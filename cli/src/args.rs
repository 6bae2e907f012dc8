//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dongle_index::IndexSettings;

use crate::init::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "dongle",
    version,
    about = "Jump to any directory under a root by fuzzy search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Choose a directory interactively and print its absolute path
    Pick {
        /// Directory to search (defaults to the current directory)
        root: Option<PathBuf>,

        /// Search every root in DONGLE_WORKSPACES together
        #[arg(long)]
        workspace: bool,

        /// Ignore the cached index and scan again
        #[arg(long)]
        rescan: bool,

        #[command(flatten)]
        tunables: Tunables,
    },

    /// Scan and cache the index for a root
    Scan {
        /// Directory to scan (defaults to the current directory)
        root: Option<PathBuf>,

        /// Scan every root in DONGLE_WORKSPACES concurrently
        #[arg(long)]
        workspace: bool,

        /// Return immediately and scan in a detached process
        #[arg(long)]
        background: bool,

        /// Stop scanning after this many milliseconds, keeping what was found
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        #[command(flatten)]
        tunables: Tunables,
    },

    /// Print every indexed directory, relative to the root
    List {
        /// Directory to list (defaults to the current directory)
        root: Option<PathBuf>,

        #[command(flatten)]
        tunables: Tunables,
    },

    /// Print shell integration defining a jump function
    Init {
        #[arg(value_enum)]
        shell: Shell,

        /// Name of the function to define
        #[arg(long = "cmd", value_name = "NAME", default_value = "dj")]
        command: String,
    },

    /// Remove cached indexes
    Clear {
        /// Root whose index to remove (defaults to the current directory)
        root: Option<PathBuf>,

        /// Remove every cached index
        #[arg(long, conflicts_with = "root")]
        all: bool,
    },
}

/// Per-invocation overrides of the DONGLE_* scan settings.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Tunables {
    /// Deepest directory level to index
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Most directories to index
    #[arg(long, value_name = "N")]
    pub max_dirs: Option<usize>,

    /// Seconds a cached index stays fresh
    #[arg(long, value_name = "SECONDS")]
    pub ttl: Option<u64>,

    /// Extra directory name to skip (repeatable)
    #[arg(long = "skip", value_name = "NAME")]
    pub skip: Vec<String>,
}

impl Tunables {
    pub fn apply(&self, settings: &mut IndexSettings) {
        if let Some(max_depth) = self.max_depth {
            settings.scan.max_depth = max_depth;
        }
        if let Some(max_dirs) = self.max_dirs {
            settings.scan.max_entries = max_dirs;
        }
        if let Some(ttl) = self.ttl {
            settings.ttl = Duration::from_secs(ttl);
        }
        settings.scan.skip_dirs.extend(self.skip.iter().cloned());
    }
}

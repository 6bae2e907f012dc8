//! The `dongle` subcommands.

use std::collections::HashSet;
use std::io::{self, ErrorKind, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitCode, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use dongle_index::{
    DirectoryIndex, IndexCache, IndexSettings, Lookup, ScanOutcome, Scanner, canonical_root,
};
use dongle_picker::{Catalog, Outcome, PickerOptions, home_relative};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::args::Command;
use crate::init;

/// Exit status when the user backs out of the picker.
pub const CANCELLED: u8 = 1;

/// Exit status for every failure.
pub const FAILURE: u8 = 2;

pub fn run(command: Command) -> Result<ExitCode> {
    let mut settings = IndexSettings::from_env();
    match command {
        Command::Pick {
            root,
            workspace,
            rescan,
            tunables,
        } => {
            tunables.apply(&mut settings);
            pick(root, workspace, rescan, &settings)
        }
        Command::Scan {
            root,
            workspace,
            background,
            timeout_ms,
            tunables,
        } => {
            if background {
                return spawn_detached();
            }
            tunables.apply(&mut settings);
            scan(root, workspace, timeout_ms, &settings)
        }
        Command::List { root, tunables } => {
            tunables.apply(&mut settings);
            list(root, &settings)
        }
        Command::Init { shell, command } => {
            print!("{}", init::script(shell, &command));
            Ok(ExitCode::SUCCESS)
        }
        Command::Clear { root, all } => clear(root, all, &settings),
    }
}

fn pick(root: Option<PathBuf>, workspace: bool, rescan: bool, settings: &IndexSettings) -> Result<ExitCode> {
    let cache = IndexCache::new(&settings.cache_dir);

    let (catalog, title) = if workspace {
        let mut seen = HashSet::new();
        let mut indexes = Vec::new();
        for root in workspace_roots(root, settings) {
            let canonical = match canonical_root(&root) {
                Ok(canonical) => canonical,
                Err(e) => {
                    warn!("Skipping workspace root: {e}");
                    continue;
                }
            };
            if !seen.insert(canonical.clone()) {
                debug!("Ignoring duplicate workspace root {}", root.display());
                continue;
            }
            match load_index(&cache, &canonical, rescan, settings) {
                Ok(index) => indexes.push(index),
                Err(e) => warn!("Skipping workspace root {}: {e:#}", root.display()),
            }
        }
        if indexes.is_empty() {
            bail!(
                "no usable workspace roots (set {} or pass a root)",
                IndexSettings::WORKSPACES_VAR
            );
        }
        let title = format!("{} workspace roots", indexes.len());
        (Catalog::workspace(&indexes), title)
    } else {
        let root = canonical_root(&root_or_cwd(root)?)?;
        let index = load_index(&cache, &root, rescan, settings)?;
        (Catalog::single(&index), home_relative(index.root()))
    };

    match dongle_picker::run(&catalog, &PickerOptions::new(title))? {
        Outcome::Committed(path) => {
            let mut stdout = io::stdout().lock();
            write_path(&mut stdout, &path)?;
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Cancelled => Ok(ExitCode::from(CANCELLED)),
    }
}

/// Write `path` and a newline byte for byte, so the shell can `cd` into
/// directories whose names are not valid UTF-8.
fn write_path(out: &mut impl Write, path: &Path) -> io::Result<()> {
    out.write_all(path.as_os_str().as_encoded_bytes())?;
    out.write_all(b"\n")
}

/// Load the cached index for a canonical root, scanning on a miss.
fn load_index(cache: &IndexCache, root: &Path, rescan: bool, settings: &IndexSettings) -> Result<DirectoryIndex> {
    if rescan {
        cache.invalidate(root)?;
    }
    match cache.load(root, settings.ttl, &settings.scan) {
        Lookup::Hit(index) => Ok(index),
        Lookup::Miss(reason) => {
            debug!("Cache miss for {}: {reason:?}", root.display());
            let _notice = ScanNotice::show();
            Ok(cache.refresh(root, settings.ttl, &Scanner::new(settings.scan.clone()))?)
        }
    }
}

fn scan(root: Option<PathBuf>, workspace: bool, timeout_ms: Option<u64>, settings: &IndexSettings) -> Result<ExitCode> {
    let roots = if workspace {
        workspace_roots(root, settings)
    } else {
        vec![root_or_cwd(root)?]
    };
    if roots.is_empty() {
        bail!(
            "no workspace roots to scan (set {} or pass a root)",
            IndexSettings::WORKSPACES_VAR
        );
    }

    let mut scanner = Scanner::new(settings.scan.clone());
    if let Some(ms) = timeout_ms {
        scanner = scanner.with_time_budget(Duration::from_millis(ms));
    }

    let cache = IndexCache::new(&settings.cache_dir);
    let mut failed = false;
    for (root, result) in warm_all(&cache, roots, settings.ttl, &scanner)? {
        match result {
            Ok(outcome) => eprintln!("{}", summary(&outcome)),
            Err(e) => {
                error!("Failed to index {}: {e}", root.display());
                failed = true;
            }
        }
    }

    Ok(if failed {
        ExitCode::from(FAILURE)
    } else {
        ExitCode::SUCCESS
    })
}

/// Warm every root on the blocking pool, returning results in root order.
fn warm_all(
    cache: &IndexCache,
    roots: Vec<PathBuf>,
    ttl: Duration,
    scanner: &Scanner,
) -> Result<Vec<(PathBuf, dongle_index::Result<ScanOutcome>)>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .build()
        .context("failed to start the scan runtime")?;

    runtime.block_on(async {
        let mut tasks = JoinSet::new();
        for (position, root) in roots.into_iter().enumerate() {
            let cache = cache.clone();
            let scanner = scanner.clone();
            tasks.spawn_blocking(move || {
                let result = cache.warm(&root, ttl, &scanner);
                (position, root, result)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            results.push(joined.context("scan task panicked")?);
        }
        results.sort_by_key(|(position, ..)| *position);
        Ok(results
            .into_iter()
            .map(|(_, root, result)| (root, result))
            .collect())
    })
}

fn summary(outcome: &ScanOutcome) -> String {
    let stats = &outcome.stats;
    let mut line = format!(
        "Indexed {} directories under {} in {}ms",
        stats.directories,
        outcome.index.root().display(),
        stats.duration_ms
    );
    if stats.unreadable > 0 {
        line.push_str(&format!(", {} unreadable", stats.unreadable));
    }
    if stats.truncated {
        line.push_str(" (truncated)");
    }
    line
}

/// Re-run this command without `--background` in a detached process.
fn spawn_detached() -> Result<ExitCode> {
    let exe = std::env::current_exe().context("cannot locate the dongle executable")?;
    let mut command = std::process::Command::new(exe);
    command
        .args(std::env::args_os().skip(1).filter(|arg| arg != "--background"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command.spawn().context("failed to start background scan")?;
    debug!("Started background scan as pid {}", child.id());
    Ok(ExitCode::SUCCESS)
}

fn list(root: Option<PathBuf>, settings: &IndexSettings) -> Result<ExitCode> {
    let cache = IndexCache::new(&settings.cache_dir);
    let index = cache.get_or_scan(&root_or_cwd(root)?, settings.ttl, &settings.scan)?;

    let mut stdout = io::stdout().lock();
    for entry in index.entries() {
        if let Err(e) = writeln!(stdout, "{}", entry.display()) {
            if e.kind() == ErrorKind::BrokenPipe {
                return Ok(ExitCode::SUCCESS);
            }
            return Err(e.into());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn clear(root: Option<PathBuf>, all: bool, settings: &IndexSettings) -> Result<ExitCode> {
    let cache = IndexCache::new(&settings.cache_dir);
    if all {
        let removed = cache.clear()?;
        eprintln!("Removed {removed} cached indexes from {}", cache.dir().display());
        return Ok(ExitCode::SUCCESS);
    }

    let root = root_or_cwd(root)?;
    if cache.invalidate(&root)? {
        eprintln!("Cleared cached index for {}", root.display());
    } else {
        eprintln!("No cached index for {}", root.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// The explicit root (if any) followed by the configured workspaces.
fn workspace_roots(root: Option<PathBuf>, settings: &IndexSettings) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = root.into_iter().collect();
    for workspace in &settings.workspaces {
        if !roots.contains(workspace) {
            roots.push(workspace.clone());
        }
    }
    roots
}

fn root_or_cwd(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("cannot determine the current directory"),
    }
}

/// A one-line "Scanning directories..." notice on stderr, erased on drop.
/// Nothing is written when stderr is not a terminal.
struct ScanNotice {
    shown: bool,
}

impl ScanNotice {
    fn show() -> Self {
        let mut stderr = io::stderr();
        let shown = stderr.is_terminal() && write!(stderr, "Scanning directories...").is_ok();
        let _ = stderr.flush();
        Self { shown }
    }
}

impl Drop for ScanNotice {
    fn drop(&mut self) {
        if self.shown {
            let _ = execute!(io::stderr(), MoveToColumn(0), Clear(ClearType::CurrentLine));
        }
    }
}

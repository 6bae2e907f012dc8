//! End-to-end tests for the `dongle` binary.
//!
//! The picker needs a real terminal, so these cover everything around it:
//! scanning, listing, clearing and the failures `pick` reports before it
//! opens `/dev/tty`.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SETTINGS_VARS: &[&str] = &[
    "DONGLE_MAX_DEPTH",
    "DONGLE_MAX_DIRS",
    "DONGLE_CACHE_TTL",
    "DONGLE_SKIP_DIRS",
    "DONGLE_SHOW_HIDDEN",
    "DONGLE_WORKSPACES",
    "DONGLE_LOG",
];

fn dongle(cache: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dongle").unwrap();
    cmd.env("DONGLE_CACHE_DIR", cache);
    for var in SETTINGS_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn tree(dirs: &[&str]) -> TempDir {
    let root = TempDir::new().unwrap();
    for dir in dirs {
        fs::create_dir_all(root.path().join(dir)).unwrap();
    }
    fs::write(root.path().join("a").join("notes.txt"), "not a directory").ok();
    root
}

fn listed(cache: &Path, root: &Path, extra: &[&str]) -> String {
    let output = dongle(cache)
        .arg("list")
        .arg(root)
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "list failed: {output:?}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_scan_then_list_skips_builtin_directories() {
    let cache = TempDir::new().unwrap();
    let root = tree(&["a/b", "a/c", "node_modules/x"]);

    dongle(cache.path())
        .arg("scan")
        .arg(root.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Indexed 3 directories"));

    let records = fs::read_dir(cache.path().join("index")).unwrap().count();
    assert_eq!(records, 1);
    assert_eq!(listed(cache.path(), root.path(), &[]), "a\na/b\na/c\n");
}

#[test]
fn test_list_honours_tunable_flags() {
    let cache = TempDir::new().unwrap();
    let root = tree(&["a/b/c", "docs", "fixtures/data"]);

    assert_eq!(
        listed(cache.path(), root.path(), &["--max-depth", "1"]),
        "a\ndocs\nfixtures\n"
    );
    assert_eq!(
        listed(cache.path(), root.path(), &["--skip", "fixtures", "--skip", "docs"]),
        "a\na/b\na/b/c\n"
    );
}

#[test]
fn test_list_honours_skip_variable() {
    let cache = TempDir::new().unwrap();
    let root = tree(&["a", "docs"]);

    let output = dongle(cache.path())
        .env("DONGLE_SKIP_DIRS", "docs")
        .arg("list")
        .arg(root.path())
        .output()
        .unwrap();

    assert_eq!(String::from_utf8(output.stdout).unwrap(), "a\n");
}

#[test]
fn test_pick_rejects_invalid_root_before_opening_terminal() {
    let cache = TempDir::new().unwrap();
    let missing = cache.path().join("does-not-exist");

    dongle(cache.path())
        .arg("pick")
        .arg(&missing)
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid root"));
}

#[test]
fn test_pick_workspace_without_roots_fails() {
    let cache = TempDir::new().unwrap();

    dongle(cache.path())
        .args(["pick", "--workspace"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no usable workspace roots"));
}

#[test]
fn test_pick_workspace_skips_unusable_roots() {
    let cache = TempDir::new().unwrap();
    let missing = cache.path().join("gone");

    dongle(cache.path())
        .env("DONGLE_WORKSPACES", &missing)
        .args(["pick", "--workspace"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Skipping workspace root"))
        .stderr(predicate::str::contains("no usable workspace roots"));
}

#[test]
fn test_scan_workspace_indexes_every_root() {
    let cache = TempDir::new().unwrap();
    let api = tree(&["a/src"]);
    let web = tree(&["a/pages"]);
    let workspaces = std::env::join_paths([api.path(), web.path()]).unwrap();

    dongle(cache.path())
        .env("DONGLE_WORKSPACES", &workspaces)
        .args(["scan", "--workspace"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Indexed 2 directories").count(2));

    let records = fs::read_dir(cache.path().join("index")).unwrap().count();
    assert_eq!(records, 2);
}

#[test]
fn test_scan_fails_when_cache_is_unwritable() {
    let scratch = TempDir::new().unwrap();
    let blocker = scratch.path().join("blocker");
    fs::write(&blocker, "a file where the cache directory should be").unwrap();
    let root = tree(&["a"]);

    dongle(&blocker)
        .arg("scan")
        .arg(root.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to write cache record"));
}

#[test]
fn test_list_still_works_when_cache_is_unwritable() {
    let scratch = TempDir::new().unwrap();
    let blocker = scratch.path().join("blocker");
    fs::write(&blocker, "a file where the cache directory should be").unwrap();
    let root = tree(&["a"]);

    assert_eq!(listed(&blocker, root.path(), &[]), "a\n");
}

#[test]
fn test_clear_removes_records() {
    let cache = TempDir::new().unwrap();
    let first = tree(&["a"]);
    let second = tree(&["a"]);

    for root in [&first, &second] {
        dongle(cache.path()).arg("scan").arg(root.path()).assert().success();
    }

    dongle(cache.path())
        .arg("clear")
        .arg(first.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Cleared cached index"));
    dongle(cache.path())
        .arg("clear")
        .arg(first.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("No cached index"));
    dongle(cache.path())
        .args(["clear", "--all"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed 1 cached indexes"));

    let records = fs::read_dir(cache.path().join("index")).unwrap().count();
    assert_eq!(records, 0);
}

#[test]
fn test_background_scan_returns_immediately() {
    let cache = TempDir::new().unwrap();
    let root = tree(&["a"]);

    dongle(cache.path())
        .args(["scan", "--background"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_init_prints_shell_function() {
    let cache = TempDir::new().unwrap();

    dongle(cache.path())
        .args(["init", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dj() {"))
        .stdout(predicate::str::contains("command dongle pick"));
    dongle(cache.path())
        .args(["init", "powershell"])
        .assert()
        .code(2);
}

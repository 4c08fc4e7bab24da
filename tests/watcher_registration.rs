// tests/watcher_registration.rs

use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::{tempdir, TempDir};
use tokio::sync::mpsc;
use tokio::time::timeout;

use devloop::engine::RuntimeEvent;
use devloop::errors::DevloopError;
use devloop::types::IgnoreMatch;
use devloop::watch::{collect_watch_dirs, spawn_watcher, IgnoreFilter, WatcherState};
use devloop_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

/// ```text
/// root/
///   src/pkg/
///   node_modules/lib/
///   my_node_modules/
///   .git/objects/
///   digit/
/// ```
fn project() -> Result<TempDir, Box<dyn Error>> {
    let dir = tempdir()?;
    for sub in [
        "src/pkg",
        "node_modules/lib",
        "my_node_modules",
        ".git/objects",
        "digit",
    ] {
        fs::create_dir_all(dir.path().join(sub))?;
    }
    fs::write(dir.path().join("src/main.go"), "package main\n")?;
    Ok(dir)
}

fn relative_set(root: &Path, dirs: &[PathBuf]) -> BTreeSet<String> {
    dirs.iter()
        .map(|d| {
            d.strip_prefix(root)
                .expect("registered dir under root")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn segment_mode_skips_only_exact_directory_names() -> TestResult {
    let dir = project()?;
    let filter = IgnoreFilter::new(["node_modules", ".git", "git"], IgnoreMatch::Segment);

    let dirs = collect_watch_dirs(&[dir.path().to_path_buf()], &filter)?;

    let expected: BTreeSet<String> = ["", "src", "src/pkg", "my_node_modules", "digit"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(relative_set(dir.path(), &dirs), expected);
    Ok(())
}

#[test]
fn substring_mode_is_coarse() -> TestResult {
    let dir = project()?;
    let filter = IgnoreFilter::new(["node_modules", "git"], IgnoreMatch::Substring);

    let dirs = collect_watch_dirs(&[dir.path().to_path_buf()], &filter)?;

    // `digit` and `my_node_modules` are caught as well.
    let expected: BTreeSet<String> = ["", "src", "src/pkg"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(relative_set(dir.path(), &dirs), expected);
    Ok(())
}

#[test]
fn ignore_filter_modes() {
    let segment = IgnoreFilter::new(["git"], IgnoreMatch::Segment);
    assert!(segment.is_ignored(Path::new("vendor/git/x")));
    assert!(!segment.is_ignored(Path::new("digit")));

    let substring = IgnoreFilter::new(["git"], IgnoreMatch::Substring);
    assert!(substring.is_ignored(Path::new("digit")));

    let none = IgnoreFilter::new(Vec::<String>::new(), IgnoreMatch::Substring);
    assert!(!none.is_ignored(Path::new("anything")));
}

#[test]
fn missing_root_is_a_registration_error() {
    let filter = IgnoreFilter::new(Vec::<String>::new(), IgnoreMatch::Segment);
    let err = collect_watch_dirs(&[PathBuf::from("/no/such/devloop/root")], &filter)
        .expect_err("root does not exist");
    assert!(matches!(err, DevloopError::WatchRegistration { .. }));
}

#[test]
fn file_as_root_is_a_registration_error() -> TestResult {
    let dir = project()?;
    let filter = IgnoreFilter::new(Vec::<String>::new(), IgnoreMatch::Segment);
    let err = collect_watch_dirs(&[dir.path().join("src/main.go")], &filter)
        .expect_err("root is a file");
    assert!(matches!(err, DevloopError::WatchRegistration { .. }));
    Ok(())
}

#[tokio::test]
async fn changes_are_forwarded_with_root_relative_paths() -> TestResult {
    init_tracing();
    let dir = project()?;
    let (tx, mut rx) = mpsc::channel(64);
    let filter = IgnoreFilter::new(["node_modules", ".git"], IgnoreMatch::Segment);

    let mut handle = spawn_watcher(&[dir.path().to_path_buf()], filter, tx)?;
    assert_eq!(handle.state(), WatcherState::Watching);
    assert_eq!(handle.registered_dirs().len(), 5);

    // Give the OS a moment to arm the watches.
    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::write(dir.path().join("node_modules/lib/index.js"), "ignored")?;
    fs::write(dir.path().join("src/pkg/util.go"), "package pkg\n")?;

    let mut seen = Vec::new();
    let found = timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            if let RuntimeEvent::FileChanged(change) = event {
                let hit = change.rel_path == "src/pkg/util.go";
                seen.push(change.rel_path);
                if hit {
                    return true;
                }
            }
        }
        false
    })
    .await?;

    assert!(found, "no event for src/pkg/util.go; saw {seen:?}");
    assert!(
        seen.iter().all(|p| !p.starts_with("node_modules")),
        "ignored directory leaked events: {seen:?}"
    );

    handle.stop();
    assert_eq!(handle.state(), WatcherState::Stopped);
    Ok(())
}

#[tokio::test]
async fn substring_mode_does_not_drop_matching_file_names() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (tx, mut rx) = mpsc::channel(64);
    let filter = IgnoreFilter::new(["git"], IgnoreMatch::Substring);

    let _handle = spawn_watcher(&[dir.path().to_path_buf()], filter, tx)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::write(dir.path().join("legit.go"), "package main\n")?;
    fs::write(dir.path().join("main.go"), "package main\n")?;

    let mut seen = Vec::new();
    let found = timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            if let RuntimeEvent::FileChanged(change) = event {
                let done = change.rel_path == "main.go";
                seen.push(change.rel_path);
                if done {
                    return true;
                }
            }
        }
        false
    })
    .await?;

    assert!(found, "no event for main.go; saw {seen:?}");
    assert!(
        seen.iter().any(|p| p == "legit.go"),
        "file name containing an ignore token was dropped: {seen:?}"
    );
    Ok(())
}

#[tokio::test]
async fn new_ignored_directory_is_not_forwarded() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let (tx, mut rx) = mpsc::channel(64);
    let filter = IgnoreFilter::new(["node_modules"], IgnoreMatch::Segment);

    let _handle = spawn_watcher(&[dir.path().to_path_buf()], filter, tx)?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::create_dir(dir.path().join("node_modules"))?;
    fs::write(dir.path().join("main.go"), "package main\n")?;

    let mut seen = Vec::new();
    let found = timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            if let RuntimeEvent::FileChanged(change) = event {
                let done = change.rel_path == "main.go";
                seen.push(change.rel_path);
                if done {
                    return true;
                }
            }
        }
        false
    })
    .await?;

    assert!(found, "no event for main.go; saw {seen:?}");
    assert!(
        !seen.iter().any(|p| p == "node_modules"),
        "ignored directory creation leaked: {seen:?}"
    );
    Ok(())
}

//! Filesystem watcher feeding the sync pipeline
//!
//! Wraps a recursive `notify` watcher, filters out ignored directories and
//! unsupported extensions, and reports files as added, changed or removed.
//! Pre-existing files are reported as added by an initial scan.

use std::fs;
use std::path::{Component, Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::extract::is_supported;

/// Directory names never descended into
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "dist",
    "build",
    "out",
    ".next",
    "coverage",
];

/// A change to a watched source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Added(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    /// A directory was moved away; everything below it is gone
    RemovedDir(PathBuf),
}

impl FileEvent {
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Added(p)
            | FileEvent::Changed(p)
            | FileEvent::Removed(p)
            | FileEvent::RemovedDir(p) => p,
        }
    }
}

/// Default ignore list as owned strings
pub fn default_ignore_dirs() -> Vec<String> {
    DEFAULT_IGNORE_DIRS.iter().map(|d| d.to_string()).collect()
}

/// Check if any component of `path` is an ignored directory name
pub fn should_ignore(path: &Path, ignore_dirs: &[String]) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| ignore_dirs.iter().any(|d| d == name)),
        _ => false,
    })
}

/// Check if `path` should be reported at all.
///
/// Only components below `root` are matched against the ignore list.
pub fn is_watchable(path: &Path, root: &Path, ignore_dirs: &[String]) -> bool {
    is_supported(path) && !should_ignore(path.strip_prefix(root).unwrap_or(path), ignore_dirs)
}

/// Recursively list supported files under `dir`, sorted
pub fn initial_scan(dir: &Path, ignore_dirs: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    scan_into(dir, ignore_dirs, &mut files);
    files.sort();
    files
}

fn scan_into(dir: &Path, ignore_dirs: &[String], files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Error reading {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            let ignored = entry
                .file_name()
                .to_str()
                .is_some_and(|name| ignore_dirs.iter().any(|d| d == name));
            if !ignored {
                scan_into(&path, ignore_dirs, files);
            }
        } else if file_type.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
}

/// Map a raw notify event to file events
pub fn translate_event(event: &Event, root: &Path, ignore_dirs: &[String]) -> Vec<FileEvent> {
    let mut out = Vec::new();

    match event.kind {
        EventKind::Create(kind) => {
            for path in &event.paths {
                if kind == CreateKind::Folder || path.is_dir() {
                    scan_added(path, root, ignore_dirs, &mut out);
                } else {
                    out.push(FileEvent::Added(path.clone()));
                }
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => {
                for path in &event.paths {
                    out.push(moved_away(path));
                }
            }
            RenameMode::To => {
                for path in &event.paths {
                    moved_in(path, root, ignore_dirs, &mut out);
                }
            }
            RenameMode::Both if event.paths.len() == 2 => {
                out.push(moved_away(&event.paths[0]));
                moved_in(&event.paths[1], root, ignore_dirs, &mut out);
            }
            _ => {
                for path in &event.paths {
                    if path.exists() {
                        moved_in(path, root, ignore_dirs, &mut out);
                    } else {
                        out.push(moved_away(path));
                    }
                }
            }
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => {}
        EventKind::Modify(_) | EventKind::Any => {
            for path in &event.paths {
                out.push(if path.exists() {
                    FileEvent::Changed(path.clone())
                } else {
                    FileEvent::Removed(path.clone())
                });
            }
        }
        EventKind::Remove(_) => {
            out.extend(event.paths.iter().cloned().map(FileEvent::Removed));
        }
        EventKind::Access(_) | EventKind::Other => {}
    }

    out.retain(|e| match e {
        FileEvent::RemovedDir(dir) => {
            !should_ignore(dir.strip_prefix(root).unwrap_or(dir), ignore_dirs)
        }
        _ => is_watchable(e.path(), root, ignore_dirs),
    });
    out
}

/// Rename source. The path is gone, so anything not named like a source
/// file is treated as a directory.
fn moved_away(path: &Path) -> FileEvent {
    if is_supported(path) {
        FileEvent::Removed(path.to_path_buf())
    } else {
        FileEvent::RemovedDir(path.to_path_buf())
    }
}

/// Rename target: a file, or a directory whose files all appear at once
fn moved_in(path: &Path, root: &Path, ignore_dirs: &[String], out: &mut Vec<FileEvent>) {
    if path.is_dir() {
        scan_added(path, root, ignore_dirs, out);
    } else {
        out.push(FileEvent::Added(path.to_path_buf()));
    }
}

fn scan_added(dir: &Path, root: &Path, ignore_dirs: &[String], out: &mut Vec<FileEvent>) {
    if !should_ignore(dir.strip_prefix(root).unwrap_or(dir), ignore_dirs) {
        out.extend(
            initial_scan(dir, ignore_dirs)
                .into_iter()
                .map(FileEvent::Added),
        );
    }
}

/// Live watcher over a root directory. Watching stops when dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root` and report every pre-existing file as added.
    ///
    /// Events are sent on `sender` from the notify thread.
    pub fn start(
        root: &Path,
        ignore_dirs: Vec<String>,
        sender: UnboundedSender<FileEvent>,
    ) -> Result<Self> {
        let event_ignore = ignore_dirs.clone();
        let event_root = root.to_path_buf();
        let event_tx = sender.clone();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for file_event in translate_event(&event, &event_root, &event_ignore) {
                        tracing::trace!("File event: {:?}", file_event);
                        let _ = event_tx.send(file_event);
                    }
                }
                Err(e) => {
                    tracing::warn!("Watch error: {}", e);
                }
            })?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        // Scan after the watch is armed so nothing created meanwhile is missed
        let existing = initial_scan(root, &ignore_dirs);
        tracing::info!(
            "Watching {} ({} existing files)",
            root.display(),
            existing.len()
        );
        for path in existing {
            let _ = sender.send(FileEvent::Added(path));
        }

        Ok(Self {
            _watcher: watcher,
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

use std::{
    fs::{self, DirEntry},
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::inventory::KnownPathSet;
use super::paths::{display_absolute, relative_to_root};

/// A file on disk that no attachment accounts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskFileEntry {
    pub relative: String,
    pub absolute: String,
    pub size: u64,
}

/// A directory the walker could not enumerate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSubtree {
    pub path: String,
    pub reason: String,
}

/// Why a walk stopped before visiting the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    Canceled,
    DeadlineExceeded,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AbortReason::Canceled => "the audit was canceled",
            AbortReason::DeadlineExceeded => "the time limit was reached",
        })
    }
}

/// How the walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum WalkStatus {
    Completed,
    Aborted(AbortReason),
}

/// Bounds applied to a single walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkLimits<'a> {
    pub orphan_cap: usize,
    pub cancel: Option<&'a AtomicBool>,
    pub deadline: Option<Instant>,
}

impl WalkLimits<'_> {
    pub fn with_cap(orphan_cap: usize) -> Self {
        WalkLimits {
            orphan_cap,
            cancel: None,
            deadline: None,
        }
    }

    fn abort_reason(&self) -> Option<AbortReason> {
        if let Some(cancel) = self.cancel
            && cancel.load(Ordering::Relaxed)
        {
            return Some(AbortReason::Canceled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Some(AbortReason::DeadlineExceeded);
        }
        None
    }
}

/// Result of walking the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskWalk {
    pub orphans: Vec<DiskFileEntry>,
    pub total_files_scanned: usize,
    pub truncated: bool,
    pub status: WalkStatus,
    pub skipped: Vec<SkippedSubtree>,
}

impl DiskWalk {
    fn empty() -> Self {
        Self {
            orphans: Vec::new(),
            total_files_scanned: 0,
            truncated: false,
            status: WalkStatus::Completed,
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, path: &Path, reason: impl ToString) {
        self.skipped.push(SkippedSubtree {
            path: display_absolute(path),
            reason: reason.to_string(),
        });
    }

    fn abort(&mut self, reason: AbortReason) {
        self.status = WalkStatus::Aborted(reason);
        self.truncated = true;
    }
}

/// Visit every regular file under `root` once, collecting unknown files up to the cap.
///
/// Entries are visited in file-name order, directories depth first. Symlinks
/// to regular files count as files; symlinked directories are not followed.
/// Never fails: an unreadable root yields an empty walk with the root listed
/// as skipped, and unreadable subdirectories are skipped individually.
pub fn walk_storage(root: &Path, known: &KnownPathSet, limits: WalkLimits<'_>) -> DiskWalk {
    let mut walk = DiskWalk::empty();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Some(reason) = limits.abort_reason() {
            walk.abort(reason);
            return walk;
        }
        let entries = match read_sorted(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    dir = %dir.display(),
                    error = %err,
                    "Failed to read directory during audit walk"
                );
                walk.skip(&dir, &err);
                continue;
            }
        };
        let mut subdirs = Vec::new();
        for entry in entries {
            let (path, size) = match classify_entry(entry, &mut walk) {
                EntryKind::File { path, size } => (path, size),
                EntryKind::Dir(path) => {
                    subdirs.push(path);
                    continue;
                }
                EntryKind::Other => continue,
            };
            if let Some(reason) = limits.abort_reason() {
                walk.abort(reason);
                return walk;
            }
            visit_file(root, &path, size, known, limits.orphan_cap, &mut walk);
        }
        stack.extend(subdirs.into_iter().rev());
    }
    walk
}

fn read_sorted(dir: &Path) -> std::io::Result<Vec<std::io::Result<DirEntry>>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect();
    entries.sort_by(|a, b| match (a, b) {
        (Ok(a), Ok(b)) => a.file_name().cmp(&b.file_name()),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => std::cmp::Ordering::Equal,
    });
    Ok(entries)
}

enum EntryKind {
    File { path: PathBuf, size: u64 },
    Dir(PathBuf),
    Other,
}

fn classify_entry(entry: std::io::Result<DirEntry>, walk: &mut DiskWalk) -> EntryKind {
    let entry = match entry {
        Ok(entry) => entry,
        Err(err) => {
            warn!(error = %err, "Failed to read directory entry during audit walk");
            return EntryKind::Other;
        }
    };
    let path = entry.path();
    let file_type = match entry.file_type() {
        Ok(file_type) => file_type,
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Failed to read file type during audit walk"
            );
            walk.skip(&path, &err);
            return EntryKind::Other;
        }
    };
    if file_type.is_symlink() {
        return match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => EntryKind::File {
                path,
                size: meta.len(),
            },
            _ => EntryKind::Other,
        };
    }
    if file_type.is_dir() {
        return EntryKind::Dir(path);
    }
    if !file_type.is_file() {
        return EntryKind::Other;
    }
    let size = match entry.metadata() {
        Ok(meta) => meta.len(),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Failed to read file size during audit walk"
            );
            0
        }
    };
    EntryKind::File { path, size }
}

fn visit_file(
    root: &Path,
    path: &Path,
    size: u64,
    known: &KnownPathSet,
    orphan_cap: usize,
    walk: &mut DiskWalk,
) {
    walk.total_files_scanned += 1;
    let Some(relative) = relative_to_root(root, path) else {
        warn!(path = %path.display(), "File outside storage root during audit walk");
        return;
    };
    if known.contains(&relative) {
        return;
    }
    if walk.orphans.len() < orphan_cap {
        walk.orphans.push(DiskFileEntry {
            relative,
            absolute: display_absolute(path),
            size,
        });
    } else {
        walk.truncated = true;
    }
}

//! Path canonicalization shared by the inventory builder and the disk walker.
//!
//! Both sides of the reconciliation must reduce a path to the same string
//! before set membership is tested: `/` separators only, relative to the
//! storage root, no leading separator, no empty or `.` segments.

use std::path::{Path, PathBuf};

/// Unify separators and collapse repeated slashes, keeping a leading `/`.
pub fn normalize_separators(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut out = String::with_capacity(unified.len());
    let mut previous_slash = false;
    for ch in unified.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(ch);
    }
    out
}

/// Normalize a path so it can be compared against other root-relative paths.
///
/// Leading separators are dropped, `.` segments removed and `..` folded into
/// the previous segment when one exists. A `..` that would climb above the
/// root is kept so the result never silently aliases a path inside the root.
/// The operation is idempotent.
pub fn normalize_relative(path: &str) -> String {
    let unified = normalize_separators(path);
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Resolve a normalized relative path against the storage root.
pub fn resolve_under_root(root: &Path, relative: &str) -> PathBuf {
    if relative.is_empty() {
        return root.to_path_buf();
    }
    relative
        .split('/')
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Express `path` relative to `root` in normalized form.
///
/// Falls back to canonicalized paths when a plain prefix strip fails, e.g.
/// when the root was given through a symlink.
pub fn relative_to_root(root: &Path, path: &Path) -> Option<String> {
    if let Ok(relative) = path.strip_prefix(root) {
        return Some(normalize_relative(&relative.to_string_lossy()));
    }
    let (Ok(canon_root), Ok(canon_path)) = (root.canonicalize(), path.canonicalize()) else {
        return None;
    };
    canon_path
        .strip_prefix(&canon_root)
        .ok()
        .map(|relative| normalize_relative(&relative.to_string_lossy()))
}

/// Render an absolute path for display with unified separators.
pub fn display_absolute(path: &Path) -> String {
    normalize_separators(&path.to_string_lossy())
}

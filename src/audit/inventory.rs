use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::media_store::{AttachmentId, AttachmentPages, AttachmentRecord, AttachmentSource};

use super::paths::{display_absolute, normalize_relative, resolve_under_root};

/// An attachment classified as broken or large.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentFinding {
    pub id: AttachmentId,
    pub title: String,
    /// Normalized relative path from the record, empty when none was stored.
    pub meta: String,
    /// Resolved absolute path, empty when no relative path was stored.
    pub absolute: String,
    pub exists: bool,
    /// Size in bytes; zero for broken attachments.
    pub size: u64,
}

/// Normalized relative paths of attachments whose files were found on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KnownPathSet {
    paths: HashSet<String>,
}

impl KnownPathSet {
    /// Insert a relative path, normalizing it first. Returns false for duplicates.
    pub fn insert(&mut self, relative: &str) -> bool {
        self.paths.insert(normalize_relative(relative))
    }

    /// Membership test for an already normalized relative path.
    pub fn contains(&self, normalized: &str) -> bool {
        self.paths.contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for KnownPathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::default();
        for path in iter {
            set.insert(path.as_ref());
        }
        set
    }
}

/// Whether every attachment record was read from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InventoryStatus {
    Complete,
    /// The source failed after `records_read` records; later records are absent.
    Partial { records_read: usize, error: String },
}

/// Output of the inventory phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub broken: Vec<AttachmentFinding>,
    pub large: Vec<AttachmentFinding>,
    pub known_paths: KnownPathSet,
    pub records_read: usize,
    pub status: InventoryStatus,
}

impl Inventory {
    fn new() -> Self {
        Self {
            broken: Vec::new(),
            large: Vec::new(),
            known_paths: KnownPathSet::default(),
            records_read: 0,
            status: InventoryStatus::Complete,
        }
    }
}

/// Classify every record from `source` against files under `root`.
pub fn build_inventory<S>(
    source: &S,
    root: &Path,
    size_threshold: u64,
    page_size: usize,
) -> Inventory
where
    S: AttachmentSource + ?Sized,
{
    let mut inventory = Inventory::new();
    for item in AttachmentPages::new(source, page_size) {
        match item {
            Ok(record) => {
                classify_record(&record, root, size_threshold, &mut inventory);
                inventory.records_read += 1;
            }
            Err(err) => {
                warn!(
                    records_read = inventory.records_read,
                    error = %err,
                    "Attachment enumeration failed; inventory is partial"
                );
                inventory.status = InventoryStatus::Partial {
                    records_read: inventory.records_read,
                    error: err.to_string(),
                };
            }
        }
    }
    debug!(
        records = inventory.records_read,
        broken = inventory.broken.len(),
        large = inventory.large.len(),
        known = inventory.known_paths.len(),
        "Attachment inventory built"
    );
    inventory
}

fn classify_record(
    record: &AttachmentRecord,
    root: &Path,
    size_threshold: u64,
    inventory: &mut Inventory,
) {
    let Some(stored) = record.recorded_path() else {
        inventory.broken.push(finding(record, String::new(), String::new(), false, 0));
        return;
    };
    let relative = normalize_relative(stored);
    let absolute_path = resolve_under_root(root, &relative);
    let absolute = display_absolute(&absolute_path);
    if !absolute_path.is_file() {
        inventory.broken.push(finding(record, relative, absolute, false, 0));
        return;
    }
    inventory.known_paths.insert(&relative);
    match std::fs::metadata(&absolute_path) {
        Ok(meta) if meta.len() >= size_threshold => {
            inventory
                .large
                .push(finding(record, relative, absolute, true, meta.len()));
        }
        Ok(_) => {}
        Err(err) => {
            debug!(
                path = %absolute,
                error = %err,
                "Size probe failed; skipping large-file check"
            );
        }
    }
}

fn finding(
    record: &AttachmentRecord,
    meta: String,
    absolute: String,
    exists: bool,
    size: u64,
) -> AttachmentFinding {
    AttachmentFinding {
        id: record.id,
        title: record.title.clone(),
        meta,
        absolute,
        exists,
        size,
    }
}

use serde::Serialize;

use super::inventory::{AttachmentFinding, Inventory, InventoryStatus};
use super::walk::{DiskFileEntry, DiskWalk, SkippedSubtree, WalkStatus};

/// Immutable outcome of one audit run.
///
/// Built only by [`ReconciliationReport::assemble`], which carries the
/// inventory and walk results over unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    broken: Vec<AttachmentFinding>,
    large: Vec<AttachmentFinding>,
    orphans: Vec<DiskFileEntry>,
    total_files_scanned: usize,
    truncated: bool,
    walk_status: WalkStatus,
    skipped_subtrees: Vec<SkippedSubtree>,
    inventory_status: InventoryStatus,
    size_threshold: u64,
    orphan_cap: usize,
}

impl ReconciliationReport {
    pub fn assemble(
        inventory: Inventory,
        walk: DiskWalk,
        size_threshold: u64,
        orphan_cap: usize,
    ) -> Self {
        Self {
            broken: inventory.broken,
            large: inventory.large,
            orphans: walk.orphans,
            total_files_scanned: walk.total_files_scanned,
            truncated: walk.truncated,
            walk_status: walk.status,
            skipped_subtrees: walk.skipped,
            inventory_status: inventory.status,
            size_threshold,
            orphan_cap,
        }
    }

    /// Attachments whose file is missing or was never recorded.
    pub fn broken(&self) -> &[AttachmentFinding] {
        &self.broken
    }

    /// Present attachments at or above the size threshold.
    pub fn large(&self) -> &[AttachmentFinding] {
        &self.large
    }

    /// Unaccounted files on disk, at most `orphan_cap` of them.
    pub fn orphans(&self) -> &[DiskFileEntry] {
        &self.orphans
    }

    /// Every regular file the walk visited, regardless of the cap.
    pub fn total_files_scanned(&self) -> usize {
        self.total_files_scanned
    }

    /// True when orphan candidates were dropped or the walk stopped early.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn walk_status(&self) -> WalkStatus {
        self.walk_status
    }

    pub fn skipped_subtrees(&self) -> &[SkippedSubtree] {
        &self.skipped_subtrees
    }

    pub fn inventory_status(&self) -> &InventoryStatus {
        &self.inventory_status
    }

    pub fn size_threshold(&self) -> u64 {
        self.size_threshold
    }

    pub fn orphan_cap(&self) -> usize {
        self.orphan_cap
    }

    /// True when no findings of any kind were produced.
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty() && self.large.is_empty() && self.orphans.is_empty()
    }
}

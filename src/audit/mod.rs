mod engine;
mod inventory;
pub mod paths;
mod report;
mod walk;

pub use engine::{
    AuditConfig, AuditEngine, DEFAULT_ORPHAN_CAP, DEFAULT_PAGE_SIZE, DEFAULT_SIZE_THRESHOLD,
};
pub use inventory::{AttachmentFinding, Inventory, InventoryStatus, KnownPathSet, build_inventory};
pub use report::ReconciliationReport;
pub use walk::{
    AbortReason, DiskFileEntry, DiskWalk, SkippedSubtree, WalkLimits, WalkStatus, walk_storage,
};

#[cfg(test)]
mod tests;

use std::{
    path::{Path, PathBuf},
    sync::atomic::AtomicBool,
    thread,
    time::{Duration, Instant},
};

use tracing::info;

use crate::media_store::{AttachmentSource, MediaDatabase, MediaStoreError};

use super::inventory::build_inventory;
use super::report::ReconciliationReport;
use super::walk::{WalkLimits, walk_storage};

/// Files at or above this many bytes are reported as large.
pub const DEFAULT_SIZE_THRESHOLD: u64 = 5 * 1024 * 1024;
/// Maximum number of orphan files listed per run.
pub const DEFAULT_ORPHAN_CAP: usize = 300;
/// Attachment records pulled from the source per page.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Run-time settings for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditConfig {
    pub size_threshold: u64,
    pub orphan_cap: usize,
    pub page_size: usize,
    /// Stop the disk walk once this much time has passed since the run began.
    pub walk_timeout: Option<Duration>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            orphan_cap: DEFAULT_ORPHAN_CAP,
            page_size: DEFAULT_PAGE_SIZE,
            walk_timeout: None,
        }
    }
}

/// Read-only reconciliation of attachment records against a storage root.
///
/// Holds no state besides its config, so one engine can serve concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct AuditEngine {
    config: AuditConfig,
}

impl AuditEngine {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Audit `root` against every record in `source`.
    pub fn run<S>(&self, source: &S, root: &Path) -> ReconciliationReport
    where
        S: AttachmentSource + ?Sized,
    {
        self.run_with_cancel(source, root, None)
    }

    /// Like [`AuditEngine::run`], stopping the walk early once `cancel` is set.
    pub fn run_with_cancel<S>(
        &self,
        source: &S,
        root: &Path,
        cancel: Option<&AtomicBool>,
    ) -> ReconciliationReport
    where
        S: AttachmentSource + ?Sized,
    {
        let started = Instant::now();
        let deadline = self
            .config
            .walk_timeout
            .and_then(|timeout| started.checked_add(timeout));
        let inventory = build_inventory(
            source,
            root,
            self.config.size_threshold,
            self.config.page_size,
        );
        let limits = WalkLimits {
            orphan_cap: self.config.orphan_cap,
            cancel,
            deadline,
        };
        let walk = walk_storage(root, &inventory.known_paths, limits);
        let report = ReconciliationReport::assemble(
            inventory,
            walk,
            self.config.size_threshold,
            self.config.orphan_cap,
        );
        info!(
            root = %root.display(),
            broken = report.broken().len(),
            large = report.large().len(),
            orphans = report.orphans().len(),
            scanned = report.total_files_scanned(),
            truncated = report.truncated(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Media audit finished"
        );
        report
    }

    /// Open `database` read-only on a background thread and audit `root`.
    pub fn run_in_background(
        &self,
        database: PathBuf,
        root: PathBuf,
    ) -> thread::JoinHandle<Result<ReconciliationReport, MediaStoreError>> {
        let engine = self.clone();
        thread::spawn(move || {
            let db = MediaDatabase::open_read_only(&database)?;
            Ok(engine.run(&db, &root))
        })
    }
}

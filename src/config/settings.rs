use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::audit::{AuditConfig, DEFAULT_ORPHAN_CAP, DEFAULT_PAGE_SIZE, DEFAULT_SIZE_THRESHOLD};
use crate::media_store::DEFAULT_FEATURED_SAMPLE_LIMIT;

pub(super) const MAX_FEATURED_SAMPLE_LIMIT: usize = 1_000;

/// Persisted audit settings.
///
/// Config keys (TOML): `storage_root`, `database`, `large_file_threshold_bytes`,
/// `orphan_list_cap`, `page_size`, `walk_timeout_secs`, `featured_sample_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Media upload directory to audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,
    /// SQLite file holding attachment and post records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(default = "default_size_threshold")]
    pub large_file_threshold_bytes: u64,
    #[serde(default = "default_orphan_cap")]
    pub orphan_list_cap: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Seconds before the disk walk gives up; unset means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_timeout_secs: Option<u64>,
    #[serde(default = "default_featured_sample_limit")]
    pub featured_sample_limit: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            storage_root: None,
            database: None,
            large_file_threshold_bytes: default_size_threshold(),
            orphan_list_cap: default_orphan_cap(),
            page_size: default_page_size(),
            walk_timeout_secs: None,
            featured_sample_limit: default_featured_sample_limit(),
        }
    }
}

impl AuditSettings {
    pub(crate) fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self.featured_sample_limit = self
            .featured_sample_limit
            .clamp(1, MAX_FEATURED_SAMPLE_LIMIT);
        self
    }

    /// Engine configuration derived from these settings.
    pub fn audit_config(&self) -> AuditConfig {
        AuditConfig {
            size_threshold: self.large_file_threshold_bytes,
            orphan_cap: self.orphan_list_cap,
            page_size: self.page_size,
            walk_timeout: self.walk_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn default_size_threshold() -> u64 {
    DEFAULT_SIZE_THRESHOLD
}

fn default_orphan_cap() -> usize {
    DEFAULT_ORPHAN_CAP
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_featured_sample_limit() -> usize {
    DEFAULT_FEATURED_SAMPLE_LIMIT
}

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read-only queries backing the audit.
pub mod read;
/// SQLite schema for the media store.
pub mod schema;
/// Paginated attachment enumeration consumed by the audit engine.
pub mod source;
/// Seeding helpers used by imports and fixtures.
pub mod write;

mod util;

pub use source::{AttachmentList, AttachmentPages, AttachmentSource};
pub use write::NewPost;

/// Default number of rows returned by the featured-image sample query.
pub const DEFAULT_FEATURED_SAMPLE_LIMIT: usize = 100;
/// Post type that is never treated as content needing a featured image.
pub const ATTACHMENT_POST_TYPE: &str = "attachment";

/// Identifier of an attachment record in the content repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub i64);

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One attachment as stored by the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: AttachmentId,
    /// Display title; not used for reconciliation.
    #[serde(default)]
    pub title: String,
    /// Stored path relative to the storage root, if one was recorded.
    pub attached_file: Option<String>,
}

impl AttachmentRecord {
    pub fn new(id: i64, attached_file: Option<&str>) -> Self {
        Self {
            id: AttachmentId(id),
            title: String::new(),
            attached_file: attached_file.map(str::to_string),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Stored path metadata, treating an empty string the same as no value.
    pub fn recorded_path(&self) -> Option<&str> {
        self.attached_file.as_deref().filter(|path| !path.is_empty())
    }
}

/// Published content lacking a featured image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub post_type: String,
    pub title: String,
    pub author: String,
    /// Publication time in epoch seconds.
    pub published_at: i64,
}

/// Errors returned when reading or seeding the media store.
#[derive(Debug, Error)]
pub enum MediaStoreError {
    /// SQLite query failed.
    #[error("Database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    /// The database file does not exist.
    #[error("Media database not found: {0}")]
    NotFound(PathBuf),
    /// Failed to create a parent directory.
    #[error("Could not write to {path}: {source}")]
    CreateDir {
        /// Path that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Database is locked or busy.
    #[error("Database is busy, please retry")]
    Busy,
    /// SQLite returned an unexpected result.
    #[error("SQLite returned an unexpected result")]
    Unexpected,
}

/// SQLite wrapper over the content repository's attachment and post tables.
pub struct MediaDatabase {
    connection: Connection,
    path: PathBuf,
}

/// Groups seeding writes into one transaction.
pub struct MediaWriteBatch<'conn> {
    tx: Transaction<'conn>,
}

impl MediaDatabase {
    /// Open (or create) a writable database and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MediaStoreError> {
        let path = path.as_ref();
        util::create_parent_if_needed(path)?;
        let connection = Connection::open(path).map_err(util::map_sql_error)?;
        let db = Self {
            connection,
            path: path.to_path_buf(),
        };
        db.apply_pragmas()?;
        schema::apply_schema(&db.connection)?;
        Ok(db)
    }

    /// Open an existing database without write access or schema changes.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, MediaStoreError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MediaStoreError::NotFound(path.to_path_buf()));
        }
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(util::map_sql_error)?;
        let db = Self {
            connection,
            path: path.to_path_buf(),
        };
        db.apply_read_only_pragmas()?;
        Ok(db)
    }

    /// Location of the backing database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a transaction for seeding rows.
    pub fn write_batch(&mut self) -> Result<MediaWriteBatch<'_>, MediaStoreError> {
        let tx = self.connection.transaction().map_err(util::map_sql_error)?;
        Ok(MediaWriteBatch { tx })
    }

    fn apply_pragmas(&self) -> Result<(), MediaStoreError> {
        self.connection
            .execute_batch(
                "PRAGMA journal_mode=WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
            )
            .map_err(util::map_sql_error)
    }

    fn apply_read_only_pragmas(&self) -> Result<(), MediaStoreError> {
        self.connection
            .execute_batch(
                "PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
            )
            .map_err(util::map_sql_error)
    }
}

impl MediaWriteBatch<'_> {
    /// Commit all queued writes.
    pub fn commit(self) -> Result<(), MediaStoreError> {
        self.tx.commit().map_err(util::map_sql_error)
    }
}

#[cfg(test)]
mod tests;

use std::path::Path;

use super::MediaStoreError;

/// Translate rusqlite errors into friendlier MediaStoreError variants.
pub(super) fn map_sql_error(err: rusqlite::Error) -> MediaStoreError {
    match err {
        rusqlite::Error::SqliteFailure(sql_err, _)
            if sql_err.extended_code == rusqlite::ffi::SQLITE_BUSY =>
        {
            MediaStoreError::Busy
        }
        rusqlite::Error::InvalidQuery
        | rusqlite::Error::InvalidParameterName(_)
        | rusqlite::Error::MultipleStatement => MediaStoreError::Unexpected,
        other => MediaStoreError::Sql(other),
    }
}

pub(super) fn create_parent_if_needed(path: &Path) -> Result<(), MediaStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| MediaStoreError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Clamp a Rust count into an SQLite LIMIT value.
pub(super) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

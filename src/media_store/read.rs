use rusqlite::types::ValueRef;
use rusqlite::{Row, params};
use tracing::warn;

use super::util::{map_sql_error, sql_limit};
use super::{
    ATTACHMENT_POST_TYPE, AttachmentId, AttachmentRecord, MediaDatabase, MediaStoreError,
    PostSummary,
};

impl MediaDatabase {
    /// Fetch up to `limit` attachments with ids greater than `after`, ascending.
    pub fn attachments_after(
        &self,
        after: Option<AttachmentId>,
        limit: usize,
    ) -> Result<Vec<AttachmentRecord>, MediaStoreError> {
        let mut stmt = self
            .connection
            .prepare_cached(
                "SELECT id, title, attached_file FROM attachments
                 WHERE id > ?1 ORDER BY id ASC LIMIT ?2",
            )
            .map_err(map_sql_error)?;
        let after = after.map(|id| id.0).unwrap_or(i64::MIN);
        let rows = stmt
            .query_map(params![after, sql_limit(limit)], attachment_from_row)
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    /// Count attachment rows.
    #[cfg(test)]
    pub(crate) fn attachment_count(&self) -> Result<usize, MediaStoreError> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM attachments", [], |row| row.get(0))
            .map_err(map_sql_error)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Names of public post types, excluding attachments.
    pub fn public_content_types(&self) -> Result<Vec<String>, MediaStoreError> {
        let mut stmt = self
            .connection
            .prepare("SELECT name FROM post_types WHERE public != 0 AND name != ?1 ORDER BY name")
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![ATTACHMENT_POST_TYPE], |row| row.get::<_, String>(0))
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    /// Published items of public content types that have no featured image.
    ///
    /// Newest first, capped at `limit`. Meant as a sample, not an export.
    pub fn published_without_featured_image(
        &self,
        limit: usize,
    ) -> Result<Vec<PostSummary>, MediaStoreError> {
        if self.public_content_types()?.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .connection
            .prepare(
                "SELECT p.id, p.post_type, p.title, p.author, p.published_at
                 FROM posts p
                 JOIN post_types t ON t.name = p.post_type
                 WHERE t.public != 0
                   AND p.post_type != ?1
                   AND p.status = 'publish'
                   AND p.thumbnail_id IS NULL
                 ORDER BY p.published_at DESC, p.id DESC
                 LIMIT ?2",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![ATTACHMENT_POST_TYPE, sql_limit(limit)], |row| {
                Ok(PostSummary {
                    id: row.get(0)?,
                    post_type: row.get(1)?,
                    title: row.get(2)?,
                    author: row.get(3)?,
                    published_at: row.get(4)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }
}

/// Decode one attachment row without failing on bad metadata.
///
/// A stored path that is not UTF-8 text comes back as `None` so the record is
/// reported broken while paging carries on past it.
fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<AttachmentRecord> {
    let id = AttachmentId(row.get(0)?);
    let title = match row.get_ref(1)? {
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::new(),
    };
    let attached_file = match row.get_ref(2)? {
        ValueRef::Null => None,
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(path) => Some(path.to_string()),
            Err(err) => {
                warn!(id = %id, error = %err, "Attachment path is not valid UTF-8");
                None
            }
        },
        other => {
            warn!(
                id = %id,
                column_type = %other.data_type(),
                "Attachment path is not stored as text"
            );
            None
        }
    };
    Ok(AttachmentRecord {
        id,
        title,
        attached_file,
    })
}

use rusqlite::params;

use super::util::map_sql_error;
use super::{AttachmentRecord, MediaStoreError, MediaWriteBatch};

impl MediaWriteBatch<'_> {
    /// Insert or replace an attachment row.
    pub fn upsert_attachment(&mut self, record: &AttachmentRecord) -> Result<(), MediaStoreError> {
        let mut stmt = self
            .tx
            .prepare_cached(
                "INSERT INTO attachments (id, title, attached_file) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title,
                    attached_file = excluded.attached_file",
            )
            .map_err(map_sql_error)?;
        stmt.execute(params![record.id.0, record.title, record.attached_file])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Register a post type and whether it is public.
    pub fn upsert_post_type(&mut self, name: &str, public: bool) -> Result<(), MediaStoreError> {
        let mut stmt = self
            .tx
            .prepare_cached(
                "INSERT INTO post_types (name, public) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET public = excluded.public",
            )
            .map_err(map_sql_error)?;
        stmt.execute(params![name, public as i64])
            .map_err(map_sql_error)?;
        Ok(())
    }

    /// Insert or replace a content item.
    pub fn upsert_post(&mut self, post: &NewPost<'_>) -> Result<(), MediaStoreError> {
        let mut stmt = self
            .tx
            .prepare_cached(
                "INSERT INTO posts (id, post_type, status, title, author, published_at, thumbnail_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET post_type = excluded.post_type,
                    status = excluded.status, title = excluded.title,
                    author = excluded.author, published_at = excluded.published_at,
                    thumbnail_id = excluded.thumbnail_id",
            )
            .map_err(map_sql_error)?;
        stmt.execute(params![
            post.id,
            post.post_type,
            post.status,
            post.title,
            post.author,
            post.published_at,
            post.thumbnail_id,
        ])
        .map_err(map_sql_error)?;
        Ok(())
    }
}

/// Borrowed row used when seeding posts.
#[derive(Debug, Clone, Copy)]
pub struct NewPost<'a> {
    pub id: i64,
    pub post_type: &'a str,
    pub status: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub published_at: i64,
    pub thumbnail_id: Option<i64>,
}

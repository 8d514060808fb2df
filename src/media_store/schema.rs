use rusqlite::Connection;

use super::MediaStoreError;
use super::util::map_sql_error;

pub(super) fn apply_schema(connection: &Connection) -> Result<(), MediaStoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS attachments (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL DEFAULT '',
                attached_file TEXT
             );
             CREATE TABLE IF NOT EXISTS post_types (
                name TEXT PRIMARY KEY,
                public INTEGER NOT NULL DEFAULT 1
             );
             CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,
                post_type TEXT NOT NULL,
                status TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                author TEXT NOT NULL DEFAULT '',
                published_at INTEGER NOT NULL DEFAULT 0,
                thumbnail_id INTEGER
             );
             CREATE INDEX IF NOT EXISTS idx_posts_type_status
                ON posts (post_type, status);
             INSERT OR IGNORE INTO post_types (name, public) VALUES
                ('post', 1), ('page', 1), ('attachment', 1);",
        )
        .map_err(map_sql_error)
}

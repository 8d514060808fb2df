use std::path::{Path, PathBuf};

use media_hygiene::media_store::{AttachmentList, AttachmentRecord, MediaDatabase, NewPost};
use tempfile::TempDir;

/// Upload tree plus media database living in one temp directory.
pub struct MediaTree {
    temp: TempDir,
    records: Vec<AttachmentRecord>,
    posts: Vec<OwnedPost>,
}

struct OwnedPost {
    id: i64,
    post_type: String,
    status: String,
    thumbnail_id: Option<i64>,
}

impl MediaTree {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        std::fs::create_dir_all(temp.path().join("uploads")).expect("create uploads dir");
        Self {
            temp,
            records: Vec::new(),
            posts: Vec::new(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.temp.path().join("uploads")
    }

    pub fn db_path(&self) -> PathBuf {
        self.temp.path().join("media.db")
    }

    /// Write a file of `bytes` length under the upload root.
    pub fn file(&self, relative: &str, bytes: usize) -> &Self {
        write_sized(&self.root().join(relative), bytes);
        self
    }

    /// Register an attachment record pointing at `relative`.
    pub fn attachment(&mut self, id: i64, relative: Option<&str>) -> &mut Self {
        self.records
            .push(AttachmentRecord::new(id, relative).with_title(format!("Attachment {id}")));
        self
    }

    /// Register an attachment and create its file in one step.
    pub fn attached_file(&mut self, id: i64, relative: &str, bytes: usize) -> &mut Self {
        write_sized(&self.root().join(relative), bytes);
        self.attachment(id, Some(relative))
    }

    pub fn post(&mut self, id: i64, post_type: &str, status: &str, thumbnail_id: Option<i64>) -> &mut Self {
        self.posts.push(OwnedPost {
            id,
            post_type: post_type.to_string(),
            status: status.to_string(),
            thumbnail_id,
        });
        self
    }

    pub fn records(&self) -> AttachmentList {
        self.records.iter().cloned().collect()
    }

    /// Write every registered record into the media database.
    pub fn seed_database(&self) -> PathBuf {
        let path = self.db_path();
        let mut db = MediaDatabase::open(&path).expect("open media db");
        let mut batch = db.write_batch().expect("write batch");
        for record in &self.records {
            batch.upsert_attachment(record).expect("seed attachment");
        }
        for post in &self.posts {
            batch
                .upsert_post(&NewPost {
                    id: post.id,
                    post_type: &post.post_type,
                    status: &post.status,
                    title: "Post",
                    author: "editor",
                    published_at: 1_700_000_000 + post.id,
                    thumbnail_id: post.thumbnail_id,
                })
                .expect("seed post");
        }
        batch.commit().expect("commit seed");
        path
    }

    /// Insert an attachment row whose path column is the raw SQL expression `path_sql`.
    ///
    /// Call after [`MediaTree::seed_database`].
    pub fn raw_attachment(&self, id: i64, path_sql: &str) {
        let conn = rusqlite::Connection::open(self.db_path()).expect("open raw connection");
        conn.execute(
            &format!(
                "INSERT INTO attachments (id, title, attached_file) VALUES (?1, 'raw', {path_sql})"
            ),
            [id],
        )
        .expect("insert raw attachment");
    }
}

pub fn write_sized(path: &Path, bytes: usize) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    let file = std::fs::File::create(path).expect("create file");
    file.set_len(bytes as u64).expect("size file");
}

use super::*;
use tempfile::tempdir;

fn post<'a>(id: i64, post_type: &'a str, status: &'a str, thumbnail_id: Option<i64>) -> NewPost<'a> {
    NewPost {
        id,
        post_type,
        status,
        title: "Title",
        author: "editor",
        published_at: 1_700_000_000 + id,
        thumbnail_id,
    }
}

#[test]
fn attachments_after_pages_by_id() {
    let dir = tempdir().unwrap();
    let mut db = MediaDatabase::open(dir.path().join("media.db")).unwrap();
    let mut batch = db.write_batch().unwrap();
    for id in [3, 1, 2] {
        batch
            .upsert_attachment(&AttachmentRecord::new(id, Some(&format!("2024/{id}.jpg"))))
            .unwrap();
    }
    batch
        .upsert_attachment(&AttachmentRecord::new(4, None).with_title("no file"))
        .unwrap();
    batch.commit().unwrap();

    let first = db.attachments_after(None, 2).unwrap();
    assert_eq!(first.iter().map(|r| r.id.0).collect::<Vec<_>>(), vec![1, 2]);
    let rest = db.attachments_after(Some(AttachmentId(2)), 10).unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[1].attached_file, None);
    assert_eq!(rest[1].title, "no file");
    assert_eq!(db.attachment_count().unwrap(), 4);
}

#[test]
fn unreadable_paths_decode_as_missing_without_ending_the_page() {
    let dir = tempdir().unwrap();
    let db = MediaDatabase::open(dir.path().join("media.db")).unwrap();
    db.connection
        .execute_batch(
            "INSERT INTO attachments (id, title, attached_file)
                 VALUES (1, 'bad utf8', CAST(X'FFFE' AS TEXT));
             INSERT INTO attachments (id, title, attached_file) VALUES (2, 'blob', X'0102');
             INSERT INTO attachments (id, title, attached_file) VALUES (3, 'ok', '2024/kept.jpg');",
        )
        .unwrap();

    let page = db.attachments_after(None, 10).unwrap();
    assert_eq!(page.iter().map(|r| r.id.0).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(page[..2].iter().all(|r| r.recorded_path().is_none()));
    assert_eq!(page[0].title, "bad utf8");
    assert_eq!(page[2].recorded_path(), Some("2024/kept.jpg"));
}

#[test]
fn read_only_open_sees_seeded_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("media.db");
    {
        let mut db = MediaDatabase::open(&path).unwrap();
        let mut batch = db.write_batch().unwrap();
        batch
            .upsert_attachment(&AttachmentRecord::new(1, Some("a.jpg")))
            .unwrap();
        batch.commit().unwrap();
    }
    let db = MediaDatabase::open_read_only(&path).unwrap();
    let pages: Vec<_> = AttachmentPages::new(&db, 10)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].recorded_path(), Some("a.jpg"));
}

#[test]
fn read_only_open_rejects_missing_file() {
    let dir = tempdir().unwrap();
    let err = MediaDatabase::open_read_only(dir.path().join("absent.db")).err().unwrap();
    assert!(matches!(err, MediaStoreError::NotFound(_)));
}

#[test]
fn featured_image_query_excludes_attachments_and_private_types() {
    let dir = tempdir().unwrap();
    let mut db = MediaDatabase::open(dir.path().join("media.db")).unwrap();
    let mut batch = db.write_batch().unwrap();
    batch.upsert_post_type("internal", false).unwrap();
    batch.upsert_post(&post(1, "post", "publish", None)).unwrap();
    batch.upsert_post(&post(2, "page", "publish", Some(10))).unwrap();
    batch.upsert_post(&post(3, "post", "draft", None)).unwrap();
    batch.upsert_post(&post(4, "attachment", "publish", None)).unwrap();
    batch.upsert_post(&post(5, "internal", "publish", None)).unwrap();
    batch.upsert_post(&post(6, "page", "publish", None)).unwrap();
    batch.commit().unwrap();

    let missing = db.published_without_featured_image(100).unwrap();
    let ids: Vec<i64> = missing.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![6, 1]);

    let capped = db.published_without_featured_image(1).unwrap();
    assert_eq!(capped.len(), 1);
}

#[test]
fn featured_image_query_is_empty_without_public_types() {
    let dir = tempdir().unwrap();
    let mut db = MediaDatabase::open(dir.path().join("media.db")).unwrap();
    let mut batch = db.write_batch().unwrap();
    batch.upsert_post_type("post", false).unwrap();
    batch.upsert_post_type("page", false).unwrap();
    batch.upsert_post(&post(1, "post", "publish", None)).unwrap();
    batch.commit().unwrap();

    assert!(db.public_content_types().unwrap().is_empty());
    assert!(db.published_without_featured_image(100).unwrap().is_empty());
}

use super::*;
use crate::media_store::{AttachmentList, AttachmentRecord};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn write(root: &Path, relative: &str, bytes: usize) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, vec![b'x'; bytes]).unwrap();
}

fn relatives(walk: &DiskWalk) -> Vec<&str> {
    walk.orphans.iter().map(|o| o.relative.as_str()).collect()
}

#[test]
fn walk_counts_known_files_but_lists_only_unknown() {
    let dir = tempdir().unwrap();
    write(dir.path(), "2024/05/a.jpg", 1);
    write(dir.path(), "2024/05/b.jpg", 2);
    write(dir.path(), "stray.txt", 3);
    let known: KnownPathSet = ["2024\\05\\a.jpg", "/2024/05/b.jpg"].into_iter().collect();

    let walk = walk_storage(dir.path(), &known, WalkLimits::with_cap(10));
    assert_eq!(walk.total_files_scanned, 3);
    assert_eq!(relatives(&walk), vec!["stray.txt"]);
    assert_eq!(walk.orphans[0].size, 3);
    assert!(!walk.truncated);
    assert_eq!(walk.status, WalkStatus::Completed);
    assert!(walk.skipped.is_empty());
}

#[test]
fn walk_visits_entries_in_name_order_depth_first() {
    let dir = tempdir().unwrap();
    write(dir.path(), "b/2.jpg", 1);
    write(dir.path(), "a/z.jpg", 1);
    write(dir.path(), "a/y/1.jpg", 1);
    write(dir.path(), "c.jpg", 1);

    let walk = walk_storage(dir.path(), &KnownPathSet::default(), WalkLimits::with_cap(10));
    assert_eq!(relatives(&walk), vec!["c.jpg", "a/z.jpg", "a/y/1.jpg", "b/2.jpg"]);
}

#[test]
fn cap_truncates_but_total_keeps_counting() {
    let dir = tempdir().unwrap();
    for idx in 0..5 {
        write(dir.path(), &format!("{idx}.bin"), 1);
    }
    let walk = walk_storage(dir.path(), &KnownPathSet::default(), WalkLimits::with_cap(2));
    assert_eq!(walk.orphans.len(), 2);
    assert!(walk.truncated);
    assert_eq!(walk.total_files_scanned, 5);
    assert_eq!(walk.status, WalkStatus::Completed);
}

#[test]
fn cap_equal_to_orphan_count_is_not_truncated() {
    let dir = tempdir().unwrap();
    for idx in 0..3 {
        write(dir.path(), &format!("{idx}.bin"), 1);
    }
    let walk = walk_storage(dir.path(), &KnownPathSet::default(), WalkLimits::with_cap(3));
    assert_eq!(walk.orphans.len(), 3);
    assert!(!walk.truncated);
}

#[test]
fn zero_cap_truncates_on_first_orphan() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one.bin", 1);
    let walk = walk_storage(dir.path(), &KnownPathSet::default(), WalkLimits::with_cap(0));
    assert!(walk.orphans.is_empty());
    assert!(walk.truncated);
    assert_eq!(walk.total_files_scanned, 1);
}

#[test]
fn missing_root_yields_empty_walk_with_skipped_root() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("absent");
    let walk = walk_storage(&root, &KnownPathSet::default(), WalkLimits::with_cap(10));
    assert_eq!(walk.total_files_scanned, 0);
    assert!(walk.orphans.is_empty());
    assert!(!walk.truncated);
    assert_eq!(walk.skipped.len(), 1);
    assert!(walk.skipped[0].path.ends_with("absent"));
}

#[test]
fn file_as_root_yields_empty_walk() {
    let dir = tempdir().unwrap();
    write(dir.path(), "not-a-dir", 1);
    let walk = walk_storage(
        &dir.path().join("not-a-dir"),
        &KnownPathSet::default(),
        WalkLimits::with_cap(10),
    );
    assert_eq!(walk.total_files_scanned, 0);
    assert_eq!(walk.skipped.len(), 1);
}

#[test]
fn preset_cancel_aborts_before_any_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one.bin", 1);
    let cancel = AtomicBool::new(true);
    let limits = WalkLimits {
        orphan_cap: 10,
        cancel: Some(&cancel),
        deadline: None,
    };
    let walk = walk_storage(dir.path(), &KnownPathSet::default(), limits);
    assert_eq!(walk.status, WalkStatus::Aborted(AbortReason::Canceled));
    assert!(walk.truncated);
    assert_eq!(walk.total_files_scanned, 0);
}

#[test]
fn elapsed_deadline_aborts_walk() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one.bin", 1);
    let limits = WalkLimits {
        orphan_cap: 10,
        cancel: None,
        deadline: Some(Instant::now()),
    };
    let walk = walk_storage(dir.path(), &KnownPathSet::default(), limits);
    assert_eq!(walk.status, WalkStatus::Aborted(AbortReason::DeadlineExceeded));
    assert!(walk.truncated);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed_but_file_links_count() {
    use std::os::unix::fs as unix_fs;

    let dir = tempdir().unwrap();
    write(dir.path(), "nested/two.jpg", 1);
    write(dir.path(), "one.jpg", 1);
    unix_fs::symlink(dir.path().join("nested"), dir.path().join("nested_link")).unwrap();
    unix_fs::symlink(dir.path().join("one.jpg"), dir.path().join("one_link.jpg")).unwrap();
    unix_fs::symlink(dir.path().join("gone.jpg"), dir.path().join("dangling.jpg")).unwrap();

    let walk = walk_storage(dir.path(), &KnownPathSet::default(), WalkLimits::with_cap(10));
    assert_eq!(walk.total_files_scanned, 3);
    assert_eq!(relatives(&walk), vec!["one.jpg", "one_link.jpg", "nested/two.jpg"]);
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_is_skipped_and_recorded() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "open/a.jpg", 1);
    write(dir.path(), "locked/b.jpg", 1);
    let locked = dir.path().join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::read_dir(&locked).is_ok() {
        // Privileged users bypass directory permissions.
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let walk = walk_storage(dir.path(), &KnownPathSet::default(), WalkLimits::with_cap(10));
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(walk.total_files_scanned, 1);
    assert_eq!(relatives(&walk), vec!["open/a.jpg"]);
    assert_eq!(walk.skipped.len(), 1);
    assert!(walk.skipped[0].path.ends_with("locked"));
    assert_eq!(walk.status, WalkStatus::Completed);
}

#[test]
fn engine_classifications_are_disjoint_and_repeatable() {
    let dir = tempdir().unwrap();
    write(dir.path(), "big.bin", 64);
    write(dir.path(), "small.bin", 8);
    write(dir.path(), "loose/extra.bin", 8);
    let records = AttachmentList::from(vec![
        AttachmentRecord::new(1, Some("big.bin")),
        AttachmentRecord::new(2, Some("small.bin")),
        AttachmentRecord::new(3, Some("gone.bin")),
        AttachmentRecord::new(4, None),
    ]);
    let engine = AuditEngine::new(AuditConfig {
        size_threshold: 32,
        page_size: 2,
        ..AuditConfig::default()
    });

    let first = engine.run(&records, dir.path());
    let second = engine.run(&records, dir.path());
    assert_eq!(first, second);

    let broken: Vec<i64> = first.broken().iter().map(|b| b.id.0).collect();
    let large: Vec<i64> = first.large().iter().map(|l| l.id.0).collect();
    assert_eq!(broken, vec![3, 4]);
    assert_eq!(large, vec![1]);
    assert!(broken.iter().all(|id| !large.contains(id)));
    assert_eq!(first.orphans().len(), 1);
    assert_eq!(first.orphans()[0].relative, "loose/extra.bin");
    assert_eq!(first.total_files_scanned(), 3);
    assert_eq!(first.inventory_status(), &InventoryStatus::Complete);
}

#[test]
fn engine_timeout_marks_report_aborted() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", 1);
    let engine = AuditEngine::new(AuditConfig {
        walk_timeout: Some(Duration::ZERO),
        ..AuditConfig::default()
    });
    let report = engine.run(&AttachmentList::default(), dir.path());
    assert_eq!(
        report.walk_status(),
        WalkStatus::Aborted(AbortReason::DeadlineExceeded)
    );
    assert!(report.truncated());
}

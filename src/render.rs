//! Plain-text rendering of an audit report for terminals and log files.

use std::fmt::Write as _;

use crate::audit::{AttachmentFinding, InventoryStatus, ReconciliationReport, WalkStatus};
use crate::media_store::PostSummary;

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Human-readable byte count: whole bytes below 1 KiB, then two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Render every report section, followed by the featured-image sample when given.
pub fn render_text(
    report: &ReconciliationReport,
    root_display: &str,
    missing_featured: Option<&[PostSummary]>,
) -> String {
    let mut out = String::new();
    render_broken(&mut out, report.broken());
    render_large(&mut out, report.large(), report.size_threshold());
    render_orphans(&mut out, report, root_display);
    if let Some(posts) = missing_featured {
        render_missing_featured(&mut out, posts);
    }
    out
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.len()));
}

fn label(finding: &AttachmentFinding) -> String {
    if finding.title.is_empty() {
        format!("#{}", finding.id)
    } else {
        format!("#{} {}", finding.id, finding.title)
    }
}

fn render_broken(out: &mut String, broken: &[AttachmentFinding]) {
    heading(out, "Broken attachments (records point to missing files)");
    if broken.is_empty() {
        let _ = writeln!(out, "No broken attachments detected.\n");
        return;
    }
    for finding in broken {
        let meta = if finding.meta.is_empty() {
            "(no file recorded)"
        } else {
            finding.meta.as_str()
        };
        let _ = writeln!(out, "{}  {meta}  {}", label(finding), finding.absolute);
    }
    out.push('\n');
}

fn render_large(out: &mut String, large: &[AttachmentFinding], threshold: u64) {
    heading(out, "Large media files");
    let _ = writeln!(out, "Threshold: {}", format_bytes(threshold));
    if large.is_empty() {
        let _ = writeln!(out, "No attachments at or above the threshold.\n");
        return;
    }
    for finding in large {
        let _ = writeln!(
            out,
            "{}  {}  {}",
            label(finding),
            format_bytes(finding.size),
            finding.meta
        );
    }
    out.push('\n');
}

fn render_orphans(out: &mut String, report: &ReconciliationReport, root_display: &str) {
    heading(out, "Orphaned files on disk");
    let _ = writeln!(
        out,
        "Scanned {} files under {root_display}.",
        report.total_files_scanned()
    );
    if let InventoryStatus::Partial { records_read, error } = report.inventory_status() {
        let _ = writeln!(
            out,
            "Attachment list incomplete after {records_read} records ({error}); some files below may belong to unread records."
        );
    }
    if let WalkStatus::Aborted(reason) = report.walk_status() {
        let _ = writeln!(
            out,
            "Walk stopped early because {reason}; counts below cover only part of the tree."
        );
    }
    for skipped in report.skipped_subtrees() {
        let _ = writeln!(out, "Skipped {}: {}", skipped.path, skipped.reason);
    }
    if report.truncated() {
        let _ = writeln!(
            out,
            "Showing the first {} orphans; the list is truncated.",
            report.orphans().len()
        );
    }
    if report.orphans().is_empty() {
        let _ = writeln!(out, "No orphaned files found.\n");
        return;
    }
    for orphan in report.orphans() {
        let _ = writeln!(out, "{}  {}", format_bytes(orphan.size), orphan.relative);
    }
    out.push('\n');
}

fn render_missing_featured(out: &mut String, posts: &[PostSummary]) {
    heading(out, "Published content with no featured image");
    if posts.is_empty() {
        let _ = writeln!(out, "Every published item has a featured image.\n");
        return;
    }
    for post in posts {
        let _ = writeln!(
            out,
            "#{} [{}] {}  by {}  {}",
            post.id,
            post.post_type,
            post.title,
            post.author,
            format_published(post.published_at)
        );
    }
    out.push('\n');
}

fn format_published(epoch_seconds: i64) -> String {
    const FORMAT: &[time::format_description::BorrowedFormatItem<'_>] =
        time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]");
    time::OffsetDateTime::from_unix_timestamp(epoch_seconds)
        .ok()
        .and_then(|date| date.format(FORMAT).ok())
        .unwrap_or_else(|| epoch_seconds.to_string())
}

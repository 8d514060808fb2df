//! Read-only audit of a media library: attachment records against the upload tree.

/// Application directory resolution.
pub mod app_dirs;
/// Reconciliation engine: inventory, disk walk and report.
pub mod audit;
/// Persisted audit settings.
pub mod config;
/// Tracing subscriber setup.
pub mod logging;
/// Attachment and post records from the content repository.
pub mod media_store;
/// Text rendering of reports.
pub mod render;

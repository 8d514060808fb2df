//! Command-line entry point: audit a media library and print the findings.

use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use media_hygiene::audit::{AuditEngine, ReconciliationReport};
use media_hygiene::config::{self, AuditSettings};
use media_hygiene::logging;
use media_hygiene::media_store::{MediaDatabase, PostSummary};
use media_hygiene::render;

fn main() {
    if let Err(err) = logging::init() {
        match logging::init_stderr_only() {
            Ok(()) => warn!(error = %err, "Run log unavailable; logging to stderr only"),
            Err(_) => eprintln!("Logging disabled: {err}"),
        }
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let settings = resolve_settings(&options)?;
    let root = settings
        .storage_root
        .clone()
        .ok_or_else(|| format!("--root is required\n\n{}", help_text()))?;
    let database = settings
        .database
        .clone()
        .ok_or_else(|| format!("--db is required\n\n{}", help_text()))?;

    let db = MediaDatabase::open_read_only(&database).map_err(|err| err.to_string())?;
    let engine = AuditEngine::new(settings.audit_config());
    let report = engine.run(&db, &root);

    let missing_featured = if options.skip_featured {
        None
    } else {
        match db.published_without_featured_image(settings.featured_sample_limit) {
            Ok(posts) => Some(posts),
            Err(err) => {
                warn!(
                    db = %db.path().display(),
                    error = %err,
                    "Featured image query failed"
                );
                None
            }
        }
    };

    if options.json {
        let output = JsonOutput {
            report: &report,
            missing_featured: missing_featured.as_deref(),
        };
        let text = serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        let root_display = media_hygiene::audit::paths::display_absolute(&root);
        print!(
            "{}",
            render::render_text(&report, &root_display, missing_featured.as_deref())
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a ReconciliationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_featured: Option<&'a [PostSummary]>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CliOptions {
    config: Option<PathBuf>,
    root: Option<PathBuf>,
    database: Option<PathBuf>,
    threshold_bytes: Option<u64>,
    orphan_cap: Option<usize>,
    page_size: Option<usize>,
    timeout_secs: Option<u64>,
    featured_limit: Option<usize>,
    skip_featured: bool,
    json: bool,
}

fn resolve_settings(options: &CliOptions) -> Result<AuditSettings, String> {
    let loaded = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(err) if options.config.is_none() => {
            warn!(error = %err, "Using default settings");
            AuditSettings::default()
        }
        Err(err) => return Err(err.to_string()),
    };
    apply_overrides(&mut settings, options);
    Ok(settings)
}

fn apply_overrides(settings: &mut AuditSettings, options: &CliOptions) {
    if let Some(root) = &options.root {
        settings.storage_root = Some(root.clone());
    }
    if let Some(database) = &options.database {
        settings.database = Some(database.clone());
    }
    if let Some(threshold) = options.threshold_bytes {
        settings.large_file_threshold_bytes = threshold;
    }
    if let Some(cap) = options.orphan_cap {
        settings.orphan_list_cap = cap;
    }
    if let Some(page_size) = options.page_size {
        settings.page_size = page_size.max(1);
    }
    if let Some(timeout) = options.timeout_secs {
        settings.walk_timeout_secs = Some(timeout);
    }
    if let Some(limit) = options.featured_limit {
        settings.featured_sample_limit = limit.max(1);
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--json" => options.json = true,
            "--no-featured" => options.skip_featured = true,
            "--config" => options.config = Some(PathBuf::from(take_value(&args, &mut idx, flag)?)),
            "--root" => options.root = Some(PathBuf::from(take_value(&args, &mut idx, flag)?)),
            "--db" => options.database = Some(PathBuf::from(take_value(&args, &mut idx, flag)?)),
            "--threshold-bytes" => {
                options.threshold_bytes = Some(parse_number(take_value(&args, &mut idx, flag)?, flag)?)
            }
            "--orphan-cap" => {
                options.orphan_cap = Some(parse_number(take_value(&args, &mut idx, flag)?, flag)?)
            }
            "--page-size" => {
                options.page_size = Some(parse_number(take_value(&args, &mut idx, flag)?, flag)?)
            }
            "--timeout-secs" => {
                options.timeout_secs = Some(parse_number(take_value(&args, &mut idx, flag)?, flag)?)
            }
            "--featured-limit" => {
                options.featured_limit =
                    Some(parse_number(take_value(&args, &mut idx, flag)?, flag)?)
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn take_value<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{flag} expects a non-negative integer, got {value:?}"))
}

fn help_text() -> String {
    [
        "media-hygiene",
        "",
        "Audit a media library for broken attachments, large files and orphaned uploads.",
        "Nothing is modified.",
        "",
        "Usage:",
        "  media-hygiene --root <uploads-dir> --db <media.db> [options]",
        "",
        "Options:",
        "  --config <path>          Settings file (default: app config dir)",
        "  --threshold-bytes <n>    Size at which an attachment counts as large",
        "  --orphan-cap <n>         Maximum orphaned files to list",
        "  --page-size <n>          Attachment records fetched per query",
        "  --timeout-secs <n>       Stop the disk walk after this many seconds",
        "  --featured-limit <n>     Rows in the missing featured image sample",
        "  --no-featured            Skip the missing featured image sample",
        "  --json                   Print the report as JSON",
    ]
    .join("\n")
}

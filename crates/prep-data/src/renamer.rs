//! Canonical renaming of monthly report PDFs.
//!
//! A report named e.g. `momr-dec-2023-final.pdf` becomes
//! `MOMR_December_2023.pdf`. Files without a month or year token are left
//! alone and reported; an existing target is never overwritten.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use prep_core::error::{PrepError, Result};
use prep_core::time_utils::full_month_name;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::reader::find_files_with_extension;

/// Extension of the files the renamer touches.
pub const REPORT_EXTENSION: &str = "pdf";

fn month_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*")
            .expect("regex is valid")
    })
}

fn year_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"20\d{2}").expect("regex is valid"))
}

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of one renamer pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    /// `(old, new)` file names of the files actually renamed.
    pub renamed: Vec<(String, String)>,
    /// Files lacking a month or year token.
    pub skipped_unparsed: Vec<String>,
    /// Files whose canonical target already exists (including files that
    /// already carry their canonical name).
    pub skipped_existing: Vec<String>,
}

impl RenameReport {
    pub fn total_seen(&self) -> usize {
        self.renamed.len() + self.skipped_unparsed.len() + self.skipped_existing.len()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Canonical name for a report file name, or `None` when the stem lacks a
/// month or a `20xx` year token.
pub fn canonical_name(file_name: &str, prefix: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    let month_token = month_pattern().captures(stem)?.get(1)?.as_str();
    let month = full_month_name(month_token)?;
    let year = year_pattern().find(stem)?.as_str();

    Some(format!("{}_{}_{}.{}", prefix, month, year, REPORT_EXTENSION))
}

/// Rename every report in `dir` to its canonical name.
///
/// Unparseable names are skipped and reported; a target that already exists
/// is left untouched, so a second pass renames nothing. I/O failures while
/// renaming abort the pass.
pub fn rename_reports(dir: &Path, prefix: &str) -> Result<RenameReport> {
    let files = find_files_with_extension(dir, REPORT_EXTENSION)?;
    let mut report = RenameReport::default();

    for path in files {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string)
        else {
            warn!("skipped (non UTF-8 name): {}", path.display());
            continue;
        };

        let Some(target_name) = canonical_name(&file_name, prefix) else {
            warn!("skipped: {}", file_name);
            report.skipped_unparsed.push(file_name);
            continue;
        };

        let target: PathBuf = dir.join(&target_name);
        if target.exists() {
            debug!("{} → {} (target exists, left as is)", file_name, target_name);
            report.skipped_existing.push(file_name);
            continue;
        }

        std::fs::rename(&path, &target).map_err(|source| PrepError::FileWrite {
            path: target.clone(),
            source,
        })?;
        info!("{} → {}", file_name, target_name);
        report.renamed.push((file_name, target_name));
    }

    info!(
        "Renamer: {} renamed, {} skipped (unparsed), {} skipped (target exists)",
        report.renamed.len(),
        report.skipped_unparsed.len(),
        report.skipped_existing.len()
    );

    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

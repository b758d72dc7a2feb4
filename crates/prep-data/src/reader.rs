//! CSV loading and file discovery.
//!
//! Every source is read into a [`SourceFrame`] with inferred column types;
//! each job then checks the columns it needs and fails fast when one is
//! absent.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use prep_core::error::{PrepError, Result};
use prep_core::models::{SourceFrame, NA_TOKENS};
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a headed CSV file into a [`SourceFrame`].
///
/// Column types are inferred over the whole file, so integer columns stay
/// integer and a column with any non-numeric token stays text. Empty fields
/// and [`NA_TOKENS`] read as null; surplus fields on a row are ignored.
pub fn load_csv(path: &Path) -> Result<SourceFrame> {
    let file = File::open(path).map_err(|source| PrepError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let null_values: Vec<PlSmallStr> = NA_TOKENS.iter().map(|t| (*t).into()).collect();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| {
            opts.with_null_values(Some(NullValues::AllColumns(null_values.clone())))
                .with_truncate_ragged_lines(true)
        })
        .into_reader_with_file_handle(file)
        .finish()?;

    debug!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );

    Ok(SourceFrame::new(source_name(path), df))
}

/// Find files directly inside `dir` whose extension matches `ext`
/// (case-insensitive), sorted by path.
pub fn find_files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!("Data path does not exist: {}", dir.display());
        return Err(PrepError::DataPathNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case(ext))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! CSV output for the processed tables.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use prep_core::error::{PrepError, Result};
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Write `df` with a header row, ISO dates and empty cells for nulls.
///
/// Columns are written in frame order with no index column. Missing parent
/// directories are created.
pub fn write_frame(path: &Path, df: &mut DataFrame) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| PrepError::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut file = File::create(path).map_err(|source| PrepError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_date_format(Some(DATE_FORMAT.into()))
        .finish(df)?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Plain-text rendering of frames and statistics for log output.

use polars::prelude::*;

use crate::calculations::describe;
use crate::error::Result;

/// Environment variable polars reads for the number of columns to display.
pub const FMT_MAX_COLS_VAR: &str = "POLARS_FMT_MAX_COLS";

/// Split a frame's table rendering into log lines.
fn frame_lines(df: &DataFrame) -> Vec<String> {
    df.to_string().lines().map(str::to_string).collect()
}

/// The first `rows` rows of `df`, rendered.
pub fn preview_lines(df: &DataFrame, rows: usize) -> Vec<String> {
    frame_lines(&df.head(Some(rows)))
}

/// Descriptive statistics of every numeric column of `df`, rendered.
pub fn describe_lines(df: &DataFrame) -> Result<Vec<String>> {
    let numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_numeric())
        .map(|c| c.name().to_string())
        .collect();
    Ok(frame_lines(&describe(df, &numeric)?))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

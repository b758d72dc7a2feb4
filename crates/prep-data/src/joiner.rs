//! Modeling dataset: FinBERT features ← GPT sentiment ← monthly prices.
//!
//! All three sources are keyed by month-end. The join chain is left-only, so
//! every FinBERT month survives even without a GPT score or a price.

use std::path::Path;

use polars::prelude::*;
use prep_core::calculations::{
    add_next_row_targets, keyword_columns, left_join, month_end_dates,
    month_end_dates_from_parts, select_columns, sort_by_date,
};
use prep_core::error::Result;
use prep_core::models::{SourceFrame, JOINED_SOURCE};
use prep_core::time_utils::parse_date;
use tracing::{debug, info};

use crate::reader::load_csv;

/// Key column of every joined table.
pub const DATE_KEY: &str = "date";

/// Columns kept from the GPT comparison file (besides the key).
pub const GPT_COLUMNS: &[&str] = &["comparison_score", "tone_change", "summary"];

/// Substrings that pull a feature column into the output.
pub const FEATURE_KEYWORDS: &[&str] = &["supply_", "demand_", "price_"];

/// Market price columns carried into the output.
pub const PRICE_COLUMNS: &[&str] = &["PP_EU", "Brent", "WTI", "NatGas"];

/// `(source, target)` pairs for the one-month-ahead targets.
pub const TARGETS: &[(&str, &str)] = &[
    ("PP_EU", "PP_EU_next_month"),
    ("Brent", "Brent_next_month"),
];

// ── Loading ───────────────────────────────────────────────────────────────────

/// GPT comparison scores, keyed by their `date` snapped to month-end.
pub fn load_gpt_sentiment(path: &Path) -> Result<SourceFrame> {
    let frame = load_csv(path)?;
    frame.require(&[DATE_KEY])?;
    frame.require(GPT_COLUMNS)?;

    let dates = month_end_dates(&frame.df, DATE_KEY, DATE_KEY, parse_date)?;
    let mut df = frame.df.select(GPT_COLUMNS.iter().copied())?;
    df.insert_column(0, dates)?;

    log_undated("GPT sentiment", &df)?;
    Ok(frame.with_df(df))
}

/// FinBERT chunked features, keyed by `year` + `month_name` snapped to
/// month-end. Every source column is kept except a pre-existing `date`.
pub fn load_finbert_features(path: &Path) -> Result<SourceFrame> {
    let frame = load_csv(path)?;
    frame.require(&["year", "month_name", "finbert_sentiment"])?;

    let dates = month_end_dates_from_parts(&frame.df, "year", "month_name", DATE_KEY)?;
    let mut df = if frame.has_column(DATE_KEY) {
        frame.df.drop(DATE_KEY)?
    } else {
        frame.df.clone()
    };
    df.insert_column(0, dates)?;

    log_undated("FinBERT features", &df)?;
    Ok(frame.with_df(df))
}

/// The master price table, its `Date` index renamed to `date`.
pub fn load_master_prices(path: &Path) -> Result<SourceFrame> {
    let frame = load_csv(path)?;
    frame.require(&["Date"])?;
    frame.require(PRICE_COLUMNS)?;

    let dates = month_end_dates(&frame.df, "Date", DATE_KEY, parse_date)?;
    let mut df = frame.df.drop("Date")?;
    df.insert_column(0, dates)?;

    log_undated("monthly prices", &df)?;
    Ok(frame.with_df(df))
}

fn log_undated(label: &str, df: &DataFrame) -> Result<()> {
    let undated = df.column(DATE_KEY)?.null_count();
    if undated > 0 {
        debug!("{}: {} rows without a usable date", label, undated);
    }
    Ok(())
}

// ── DatasetJoiner ─────────────────────────────────────────────────────────────

/// Builds the modeling dataset from already-loaded frames.
pub struct DatasetJoiner;

impl DatasetJoiner {
    /// Join, sort, derive next-month targets and select the output columns.
    ///
    /// Fails before producing anything when a required column is absent.
    pub fn build(
        finbert: &SourceFrame,
        gpt: &SourceFrame,
        prices: &SourceFrame,
    ) -> Result<SourceFrame> {
        info!("Merging FinBERT and GPT sentiment...");
        let sentiment = left_join(&finbert.df, &gpt.df, DATE_KEY)?;

        info!("Adding {} prices...", PRICE_COLUMNS.join(", "));
        let joined = left_join(&sentiment, &prices.df, DATE_KEY)?;
        let joined = SourceFrame::new(JOINED_SOURCE, sort_by_date(&joined, DATE_KEY)?);

        let joined = Self::add_targets(&joined)?;

        let columns = Self::output_columns(&joined);
        select_columns(&joined, &columns)
    }

    /// Append each target as its source column shifted back one row.
    pub fn add_targets(frame: &SourceFrame) -> Result<SourceFrame> {
        let sources: Vec<&str> = TARGETS.iter().map(|(source, _)| *source).collect();
        frame.require(sources.as_slice())?;
        Ok(frame.with_df(add_next_row_targets(&frame.df, TARGETS)?))
    }

    /// The curated output column list for `frame`.
    pub fn output_columns(frame: &SourceFrame) -> Vec<String> {
        let mut columns: Vec<String> = vec![
            DATE_KEY.to_string(),
            "comparison_score".to_string(),
            "finbert_sentiment".to_string(),
        ];
        columns.extend(keyword_columns(&frame.columns(), FEATURE_KEYWORDS));
        columns.extend(PRICE_COLUMNS.iter().map(|c| c.to_string()));
        columns.extend(TARGETS.iter().map(|(_, t)| t.to_string()));
        columns
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Master monthly price table.
//!
//! Combines the monthly polypropylene series with the weekly crude (Brent,
//! WTI) and natural-gas series, all resampled to month-end.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use prep_core::calculations::{month_end_dates, resample_monthly_mean, PriceCalculator};
use prep_core::error::{PrepError, Result};
use prep_core::models::SourceFrame;
use prep_core::settings::PathsConfig;
use prep_core::time_utils::{parse_date, parse_month_label};
use tracing::{debug, info, warn};

use crate::reader::load_csv;

/// Date column of every series and of the master price table.
pub const PRICE_DATE_KEY: &str = "Date";

/// Decimal places kept in the master price table.
pub const PRICE_DECIMALS: u32 = 2;

// ── Source descriptions ───────────────────────────────────────────────────────

/// Native sampling of a raw price file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// One row per month, labelled `Mon YYYY`.
    Monthly,
    /// One row per week, with a parseable date.
    Weekly,
}

/// Keep only rows whose `column` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter {
    pub column: String,
    pub value: String,
}

/// Where one commodity series comes from and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSource {
    pub path: PathBuf,
    pub frequency: Frequency,
    pub date_column: String,
    pub value_column: String,
    pub label: Option<LabelFilter>,
    /// Column name in the master table.
    pub output: String,
}

impl PriceSource {
    fn weekly(path: PathBuf, label: Option<(&str, &str)>, output: &str) -> Self {
        Self {
            path,
            frequency: Frequency::Weekly,
            date_column: "Date".to_string(),
            value_column: "Close".to_string(),
            label: label.map(|(column, value)| LabelFilter {
                column: column.to_string(),
                value: value.to_string(),
            }),
            output: output.to_string(),
        }
    }
}

/// The four commodity series of the standard project layout, in output
/// column order: `PP_EU`, `Brent`, `WTI`, `NatGas`.
pub fn default_sources(paths: &PathsConfig) -> Vec<PriceSource> {
    vec![
        PriceSource {
            path: paths.polypropylene_file(),
            frequency: Frequency::Monthly,
            date_column: "Month".to_string(),
            value_column: "PP_Avg_EUR_per_t".to_string(),
            label: None,
            output: "PP_EU".to_string(),
        },
        PriceSource::weekly(
            paths.crude_oil_file(),
            Some(("Commodity", "Brent_Crude")),
            "Brent",
        ),
        PriceSource::weekly(paths.crude_oil_file(), Some(("Commodity", "WTI_Crude")), "WTI"),
        PriceSource::weekly(paths.natgas_file(), None, "NatGas"),
    ]
}

// ── Series extraction ─────────────────────────────────────────────────────────

/// Pull one commodity out of a loaded frame and resample it to month-end.
///
/// Missing columns abort. Rows with an unparseable date are dropped and
/// non-numeric values read as null. The result has a `Date` column and one
/// float column named after the source's output.
pub fn extract_series(frame: &SourceFrame, source: &PriceSource) -> Result<DataFrame> {
    let mut required = vec![source.date_column.as_str(), source.value_column.as_str()];
    if let Some(filter) = &source.label {
        required.push(filter.column.as_str());
    }
    frame.require(required.as_slice())?;

    let mut rows = frame.df.clone().lazy();
    if let Some(filter) = &source.label {
        rows = rows.filter(
            col(filter.column.as_str())
                .cast(DataType::String)
                .eq(lit(filter.value.as_str())),
        );
    }
    let picked = rows
        .select([
            col(source.date_column.as_str()),
            col(source.value_column.as_str())
                .cast(DataType::Float64)
                .alias(source.output.as_str()),
        ])
        .collect()?;

    let parse: fn(&str) -> Option<NaiveDate> = match source.frequency {
        Frequency::Monthly => parse_month_label,
        Frequency::Weekly => parse_date,
    };
    let dates = month_end_dates(&picked, &source.date_column, PRICE_DATE_KEY, parse)?;

    let undated = dates.null_count();
    if undated > 0 {
        debug!(
            "{}: dropped {} rows with unparseable {}",
            source.output, undated, source.date_column
        );
    }
    if undated == picked.height() {
        warn!(
            "{}: no dated observations in {}",
            source.output, frame.source_name
        );
    }

    let mut dated = picked.drop(&source.date_column)?;
    dated.insert_column(0, dates)?;
    resample_monthly_mean(&dated, PRICE_DATE_KEY, &source.output)
}

// ── PriceAggregator ───────────────────────────────────────────────────────────

/// Builds the master monthly price table.
pub struct PriceAggregator;

impl PriceAggregator {
    /// Load every source (each file read once), align on month-end, cut at
    /// `start`, forward-fill, drop incomplete rows and round.
    pub fn build(sources: &[PriceSource], start: NaiveDate) -> Result<DataFrame> {
        let mut loaded: HashMap<&Path, SourceFrame> = HashMap::new();
        let mut series: Vec<DataFrame> = Vec::with_capacity(sources.len());

        for source in sources {
            if !loaded.contains_key(source.path.as_path()) {
                info!("Loading {}", source.path.display());
                loaded.insert(source.path.as_path(), load_csv(&source.path)?);
            }
            let frame = &loaded[source.path.as_path()];
            let s = extract_series(frame, source)?;
            debug!("{}: {} monthly points", source.output, s.height());
            series.push(s);
        }

        Self::combine(&series, start)
    }

    /// The clean-up half of [`PriceAggregator::build`], over resampled series.
    pub fn combine(series: &[DataFrame], start: NaiveDate) -> Result<DataFrame> {
        let combined = PriceCalculator::outer_combine(series, PRICE_DATE_KEY, start)?;
        let filled = PriceCalculator::forward_fill(&combined)?;
        let (complete, dropped) = PriceCalculator::drop_incomplete(&filled)?;
        if dropped > 0 {
            debug!("Dropped {} incomplete months after forward-fill", dropped);
        }
        let table = PriceCalculator::round_values(&complete, PRICE_DECIMALS)?;

        if table.height() == 0 {
            return Err(PrepError::EmptyTable(format!(
                "no complete months on or after {}",
                start
            )));
        }
        Ok(table)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

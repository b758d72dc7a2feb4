use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::Result;
use crate::models::SourceFrame;
use crate::time_utils::{date_from_year_month, month_end, month_ends_between};

// ── Date columns ──────────────────────────────────────────────────────────────

/// Parse `column` cell by cell into a month-end `Date` series named `name`.
///
/// Cells `parse` rejects become null, so the row stays in the frame but
/// never matches a join key and drops out of resampling.
pub fn month_end_dates<F>(df: &DataFrame, column: &str, name: &str, parse: F) -> Result<Series>
where
    F: Fn(&str) -> Option<NaiveDate>,
{
    let text = df.column(column)?.cast(&DataType::String)?;
    let dates = text
        .str()?
        .into_iter()
        .map(|cell| cell.and_then(&parse).map(month_end));
    Ok(DateChunked::from_naive_date_options(name.into(), dates).into_series())
}

/// Month-end dates built from separate year and month-name columns.
pub fn month_end_dates_from_parts(
    df: &DataFrame,
    year_column: &str,
    month_column: &str,
    name: &str,
) -> Result<Series> {
    let years = df.column(year_column)?.cast(&DataType::String)?;
    let months = df.column(month_column)?.cast(&DataType::String)?;
    let dates = years
        .str()?
        .into_iter()
        .zip(months.str()?.into_iter())
        .map(|(year, month)| match (year, month) {
            (Some(year), Some(month)) => date_from_year_month(year, month).map(month_end),
            _ => None,
        });
    Ok(DateChunked::from_naive_date_options(name.into(), dates).into_series())
}

/// The non-null values of a `Date` column, in frame order.
pub fn date_values(df: &DataFrame, column: &str) -> Result<Vec<NaiveDate>> {
    Ok(df.column(column)?.date()?.as_date_iter().flatten().collect())
}

/// One-column frame of `dates` under `key`.
pub fn calendar<I>(key: &str, dates: I) -> DataFrame
where
    I: IntoIterator<Item = NaiveDate>,
{
    DateChunked::from_naive_date(key.into(), dates)
        .into_series()
        .into_frame()
}

// ── Resampling ────────────────────────────────────────────────────────────────

/// Average `value` per month-end `key`.
///
/// Rows without a date are ignored. Every month between the first and last
/// dated row appears in the result, sorted; months with no usable
/// observation hold null.
pub fn resample_monthly_mean(df: &DataFrame, key: &str, value: &str) -> Result<DataFrame> {
    let means = df
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([col(value).cast(DataType::Float64).mean()])
        .collect()?;

    let months = date_values(&means, key)?;
    let (Some(first), Some(last)) = (months.iter().min(), months.iter().max()) else {
        return Ok(means);
    };

    let resampled = calendar(key, month_ends_between(*first, *last))
        .lazy()
        .join(
            means.lazy(),
            [col(key)],
            [col(key)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(resampled)
}

// ── PriceCalculator ───────────────────────────────────────────────────────────

/// Clean-up steps applied to the combined price table.
pub struct PriceCalculator;

impl PriceCalculator {
    /// Align resampled series on the union of their dates, keeping only
    /// dates on or after `start`. Columns follow `series` order.
    pub fn outer_combine(series: &[DataFrame], key: &str, start: NaiveDate) -> Result<DataFrame> {
        let mut months: BTreeSet<NaiveDate> = BTreeSet::new();
        for frame in series {
            months.extend(date_values(frame, key)?);
        }

        let mut combined = calendar(key, months.range(start..).copied()).lazy();
        for frame in series {
            combined = combined.join(
                frame.clone().lazy(),
                [col(key)],
                [col(key)],
                JoinArgs::new(JoinType::Left),
            );
        }
        Ok(combined.collect()?)
    }

    /// Carry the last known value of each column forward into later gaps.
    pub fn forward_fill(df: &DataFrame) -> Result<DataFrame> {
        Ok(df.fill_null(FillNullStrategy::Forward(None))?)
    }

    /// Drop every row that still holds a null; returns the dropped count.
    pub fn drop_incomplete(df: &DataFrame) -> Result<(DataFrame, usize)> {
        let kept = df.drop_nulls::<String>(None)?;
        let dropped = df.height() - kept.height();
        Ok((kept, dropped))
    }

    /// Round every float column to `decimals` places, ties to even.
    pub fn round_values(df: &DataFrame, decimals: u32) -> Result<DataFrame> {
        let float_columns: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::Float64)
            .map(|c| c.name().to_string())
            .collect();

        let mut out = df.clone();
        for name in float_columns {
            let rounded: Vec<Option<f64>> = df
                .column(&name)?
                .f64()?
                .into_iter()
                .map(|v| v.map(|x| round_half_even(x, decimals)))
                .collect();
            out.with_column(Series::new(name.as_str().into(), rounded))?;
        }
        Ok(out)
    }
}

/// Round to `decimals` places with ties going to the even neighbour.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

// ── Joins and reshaping ───────────────────────────────────────────────────────

/// Left-join `right` onto `left` by `key`.
///
/// Every left row is kept and each match contributes one output row. Null
/// keys never match. Non-key columns present on both sides get `_x` (left)
/// and `_y` (right) suffixes.
pub fn left_join(left: &DataFrame, right: &DataFrame, key: &str) -> Result<DataFrame> {
    let left_names = column_names(left);
    let right_names: HashSet<String> = column_names(right).into_iter().collect();
    let overlap: HashSet<String> = left_names
        .into_iter()
        .filter(|c| c != key && right_names.contains(c))
        .collect();

    let joined = with_suffix(left, &overlap, "_x")
        .join(
            with_suffix(right, &overlap, "_y"),
            [col(key)],
            [col(key)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(joined)
}

fn with_suffix(df: &DataFrame, overlap: &HashSet<String>, suffix: &str) -> LazyFrame {
    let exprs: Vec<Expr> = column_names(df)
        .into_iter()
        .map(|name| {
            if overlap.contains(&name) {
                col(name.as_str()).alias(format!("{}{}", name, suffix))
            } else {
                col(name.as_str())
            }
        })
        .collect();
    df.clone().lazy().select(exprs)
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Stable sort by `key`; rows without a date go last.
pub fn sort_by_date(df: &DataFrame, key: &str) -> Result<DataFrame> {
    let sorted = df
        .clone()
        .lazy()
        .sort(
            [key],
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;
    Ok(sorted)
}

/// Append each `(source, target)` as `source` shifted back one row; the
/// last row of every target is null.
pub fn add_next_row_targets(df: &DataFrame, targets: &[(&str, &str)]) -> Result<DataFrame> {
    let exprs: Vec<Expr> = targets
        .iter()
        .map(|(source, target)| col(*source).shift(lit(-1)).alias(*target))
        .collect();
    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

/// Column names containing any of `keywords`, in frame order.
pub fn keyword_columns(columns: &[String], keywords: &[&str]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| keywords.iter().any(|k| c.contains(k)))
        .cloned()
        .collect()
}

/// Restrict `frame` to `names` in the given order. Duplicates keep their
/// first position; any absent name fails before anything is selected.
pub fn select_columns(frame: &SourceFrame, names: &[String]) -> Result<SourceFrame> {
    let mut seen: HashSet<&str> = HashSet::new();
    let picked: Vec<String> = names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect();

    frame.require(&picked)?;
    Ok(frame.with_df(frame.df.select(picked)?))
}

// ── Descriptive statistics ────────────────────────────────────────────────────

/// One row of a [`describe`] table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Count,
    Mean,
    /// Sample standard deviation (one delta degree of freedom).
    Std,
    Min,
    /// Linear-interpolated quantile in `[0, 1]`.
    Quantile(f64),
    Max,
}

impl Statistic {
    pub const SUMMARY: [Statistic; 8] = [
        Statistic::Count,
        Statistic::Mean,
        Statistic::Std,
        Statistic::Min,
        Statistic::Quantile(0.25),
        Statistic::Quantile(0.5),
        Statistic::Quantile(0.75),
        Statistic::Max,
    ];

    pub fn label(self) -> String {
        match self {
            Statistic::Count => "count".to_string(),
            Statistic::Mean => "mean".to_string(),
            Statistic::Std => "std".to_string(),
            Statistic::Min => "min".to_string(),
            Statistic::Quantile(q) => format!("{}%", (q * 100.0).round() as i64),
            Statistic::Max => "max".to_string(),
        }
    }

    fn expr(self, column: &str) -> Expr {
        let c = col(column);
        match self {
            Statistic::Count => c.count(),
            Statistic::Mean => c.mean(),
            Statistic::Std => c.std(1),
            Statistic::Min => c.min(),
            Statistic::Quantile(q) => c.quantile(lit(q), QuantileInterpolOptions::Linear),
            Statistic::Max => c.max(),
        }
    }
}

/// Summary table of `columns`: a `statistic` label column followed by one
/// float column per input column, one row per [`Statistic::SUMMARY`] entry.
pub fn describe(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let rows: Vec<LazyFrame> = Statistic::SUMMARY
        .iter()
        .map(|stat| {
            let mut exprs = vec![lit(stat.label()).alias("statistic")];
            exprs.extend(columns.iter().map(|c| {
                stat.expr(c)
                    .cast(DataType::Float64)
                    .alias(c.as_str())
            }));
            df.clone().lazy().select(exprs)
        })
        .collect();
    Ok(concat(rows, UnionArgs::default())?.collect()?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

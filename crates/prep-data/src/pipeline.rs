//! Top-level job runners.
//!
//! Each runner reads all of its inputs, transforms in memory, writes exactly
//! one output (or renames in place) and logs a summary. Nothing is written
//! when any step fails.

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use prep_core::calculations::date_values;
use prep_core::error::Result;
use prep_core::formatting::{describe_lines, preview_lines};
use prep_core::models::SourceFrame;
use prep_core::settings::PathsConfig;
use prep_core::time_utils::format_month_year;
use tracing::info;

use crate::aggregator::{default_sources, PriceAggregator, PRICE_DATE_KEY};
use crate::joiner::{load_finbert_features, load_gpt_sentiment, load_master_prices, DatasetJoiner};
use crate::renamer::{rename_reports, RenameReport};
use crate::writer::write_frame;

/// Rename the monthly reports in the reports directory.
pub fn run_rename(paths: &PathsConfig, prefix: &str) -> Result<RenameReport> {
    info!("Renaming reports in {}", paths.reports_dir.display());
    let report = rename_reports(&paths.reports_dir, prefix)?;
    info!("Renamer saw {} report files", report.total_seen());
    Ok(report)
}

/// Build and write `master_monthly_prices.csv`.
pub fn run_prices(paths: &PathsConfig, start: NaiveDate, preview_rows: usize) -> Result<DataFrame> {
    let mut table = PriceAggregator::build(&default_sources(paths), start)?;

    info!("Combined dataset preview:");
    for line in preview_lines(&table, preview_rows) {
        info!("  {}", line);
    }
    let months = date_values(&table, PRICE_DATE_KEY)?;
    if let (Some(first), Some(last)) = (months.first(), months.last()) {
        info!(
            "Data coverage: {} → {} ({} months)",
            format_month_year(*first),
            format_month_year(*last),
            months.len()
        );
    }
    let columns: Vec<&str> = table
        .get_column_names()
        .iter()
        .map(|c| c.as_str())
        .filter(|c| *c != PRICE_DATE_KEY)
        .collect();
    info!("Columns: {}", columns.join(", "));
    info!("Description:");
    for line in describe_lines(&table)? {
        info!("  {}", line);
    }

    let output = paths.master_prices_file();
    write_frame(&output, &mut table)?;
    info!("Master monthly dataset saved to {}", output.display());
    Ok(table)
}

/// Build and write `master_opec_price_model_dataset.csv`.
pub fn run_join(paths: &PathsConfig, preview_rows: usize) -> Result<SourceFrame> {
    info!("Loading GPT comparison sentiment...");
    let gpt = load_gpt_sentiment(&paths.gpt_sentiment_file())?;
    info!("Loading FinBERT chunked features...");
    let finbert = load_finbert_features(&paths.finbert_features_file())?;
    info!("Loading monthly price dataset...");
    let prices = load_master_prices(&paths.master_prices_file())?;

    let mut dataset = DatasetJoiner::build(&finbert, &gpt, &prices)?;

    let output = paths.model_dataset_file();
    write_frame(&output, &mut dataset.df)?;
    info!(
        "Master modeling dataset saved to {} ({} rows, {} columns)",
        output.display(),
        dataset.height(),
        dataset.df.width()
    );

    info!("Preview:");
    for line in preview_lines(&dataset.df, preview_rows) {
        info!("  {}", line);
    }
    Ok(dataset)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn seed_project(base: &Path) -> PathsConfig {
        let paths = PathsConfig::from_base(base);
        std::fs::create_dir_all(&paths.prices_dir).unwrap();
        std::fs::create_dir_all(&paths.reports_dir).unwrap();

        std::fs::write(
            paths.polypropylene_file(),
            "Month,PP_Avg_EUR_per_t\nJan 2020,1000\nFeb 2020,1015\nMar 2020,990\n",
        )
        .unwrap();
        std::fs::write(
            paths.crude_oil_file(),
            "Date,Commodity,Close\n\
             2020-01-10,Brent_Crude,64.98\n\
             2020-01-24,Brent_Crude,60.70\n\
             2020-02-14,Brent_Crude,57.32\n\
             2020-03-13,Brent_Crude,33.85\n\
             2020-01-10,WTI_Crude,59.04\n\
             2020-02-14,WTI_Crude,52.05\n\
             2020-03-13,WTI_Crude,31.73\n",
        )
        .unwrap();
        std::fs::write(
            paths.natgas_file(),
            "Date,Close\n,NG=F\n2020-01-10,2.2\n2020-02-14,1.85\n2020-03-13,1.87\n",
        )
        .unwrap();
        std::fs::write(
            paths.gpt_sentiment_file(),
            "date,comparison_score,tone_change,summary\n2020-02-12,-1,softer,Demand revised down\n",
        )
        .unwrap();
        std::fs::write(
            paths.finbert_features_file(),
            "year,month_name,finbert_sentiment,supply_mentions\n\
             2020,January,0.1,3\n2020,February,-0.2,5\n2020,March,-0.4,8\n",
        )
        .unwrap();
        std::fs::write(paths.reports_dir.join("momr-feb-2020.pdf"), "pdf").unwrap();
        paths
    }

    #[test]
    fn test_run_prices_then_join_end_to_end() {
        let dir = TempDir::new().unwrap();
        let paths = seed_project(dir.path());

        let prices = run_prices(&paths, d(2019, 1, 1), 5).unwrap();
        assert_eq!(prices.height(), 3);
        let brent: Vec<Option<f64>> = prices
            .column("Brent")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(brent, vec![Some(62.84), Some(57.32), Some(33.85)]);

        let written = std::fs::read_to_string(paths.master_prices_file()).unwrap();
        assert!(written.starts_with("Date,PP_EU,Brent,WTI,NatGas\n2020-01-31,1000.0,62.84,59.04,2.2\n"));

        let dataset = run_join(&paths, 5).unwrap();
        assert_eq!(dataset.height(), 3);

        let written = std::fs::read_to_string(paths.model_dataset_file()).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("date,comparison_score,finbert_sentiment,supply_mentions,PP_EU,Brent,WTI,NatGas,PP_EU_next_month,Brent_next_month")
        );
        assert_eq!(
            lines.next(),
            Some("2020-01-31,,0.1,3,1000.0,62.84,59.04,2.2,1015.0,57.32")
        );
        assert_eq!(
            lines.next(),
            Some("2020-02-29,-1,-0.2,5,1015.0,57.32,52.05,1.85,990.0,33.85")
        );
        assert_eq!(
            lines.next(),
            Some("2020-03-31,,-0.4,8,990.0,33.85,31.73,1.87,,")
        );
    }

    #[test]
    fn test_run_join_without_price_table_fails_without_output() {
        let dir = TempDir::new().unwrap();
        let paths = seed_project(dir.path());

        assert!(run_join(&paths, 5).is_err());
        assert!(!paths.model_dataset_file().exists());
    }

    #[test]
    fn test_run_rename_in_project_layout() {
        let dir = TempDir::new().unwrap();
        let paths = seed_project(dir.path());

        let report = run_rename(&paths, "MOMR").unwrap();
        assert_eq!(report.renamed.len(), 1);
        assert!(paths.reports_dir.join("MOMR_February_2020.pdf").exists());
    }
}

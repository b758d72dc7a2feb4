use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PrepError, Result};

/// Default cutoff for the master price table.
pub const DEFAULT_START_DATE: &str = "2019-01-01";

/// Default prefix for canonical report names.
pub const DEFAULT_PREFIX: &str = "MOMR";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Offline data preparation for the commodity price / OPEC sentiment models
#[derive(Parser, Debug, Clone)]
#[command(
    name = "commodity-prep",
    about = "Offline data preparation for the commodity price / OPEC sentiment models",
    version
)]
pub struct Settings {
    /// Job to run
    #[arg(default_value = "all", value_parser = ["rename", "prices", "join", "all"])]
    pub job: String,

    /// Project base directory (remembered between runs)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Directory holding the monthly OPEC reports and sentiment CSVs
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    /// Directory holding the raw price CSVs
    #[arg(long)]
    pub prices_dir: Option<PathBuf>,

    /// Directory receiving processed outputs
    #[arg(long)]
    pub processed_dir: Option<PathBuf>,

    /// Prefix for canonical report file names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// First date kept in the master price table (YYYY-MM-DD)
    #[arg(long, default_value = DEFAULT_START_DATE)]
    pub start_date: String,

    /// Rows shown in log previews
    #[arg(long, default_value = "10")]
    pub preview_rows: usize,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.commodity-prep/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".commodity-prep").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        if !is_arg_explicitly_set(&matches, "base_dir") && settings.base_dir.is_none() {
            settings.base_dir = last.base_dir;
        }
        if !is_arg_explicitly_set(&matches, "prefix") {
            if let Some(v) = last.prefix {
                settings.prefix = v;
            }
        }

        settings = Self::resolve(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Fill the base directory and apply the `--debug` flag.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.base_dir.is_none() {
            settings.base_dir = Some(PathBuf::from("."));
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The validated price-table cutoff.
    pub fn start_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(self.start_date.trim(), "%Y-%m-%d").map_err(|_| {
            PrepError::Config(format!(
                "start date \"{}\" is not YYYY-MM-DD",
                self.start_date
            ))
        })
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            base_dir: s.base_dir.clone(),
            prefix: Some(s.prefix.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── PathsConfig ────────────────────────────────────────────────────────────────

/// Every input and output location used by the jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub reports_dir: PathBuf,
    pub prices_dir: PathBuf,
    pub processed_dir: PathBuf,
}

impl PathsConfig {
    /// Standard project layout under `base`.
    pub fn from_base(base: &Path) -> Self {
        let data = base.join("data");
        Self {
            reports_dir: data.join("reports").join("energy").join("opec"),
            prices_dir: data.join("prices"),
            processed_dir: data.join("processed"),
        }
    }

    /// Layout under the settings' base directory, with per-directory overrides.
    pub fn from_settings(settings: &Settings) -> Self {
        let base = settings
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let mut paths = Self::from_base(&base);
        if let Some(dir) = &settings.reports_dir {
            paths.reports_dir = dir.clone();
        }
        if let Some(dir) = &settings.prices_dir {
            paths.prices_dir = dir.clone();
        }
        if let Some(dir) = &settings.processed_dir {
            paths.processed_dir = dir.clone();
        }
        paths
    }

    pub fn polypropylene_file(&self) -> PathBuf {
        self.prices_dir.join("polypropylene_primary_avg_prices.csv")
    }

    pub fn crude_oil_file(&self) -> PathBuf {
        self.prices_dir.join("crude_oil_weekly_clean.csv")
    }

    pub fn natgas_file(&self) -> PathBuf {
        self.prices_dir.join("natgas_weekly.csv")
    }

    pub fn gpt_sentiment_file(&self) -> PathBuf {
        self.reports_dir.join("opec_comparison_scores_gpt.csv")
    }

    pub fn finbert_features_file(&self) -> PathBuf {
        self.reports_dir.join("opec_features_finbert_chunked.csv")
    }

    pub fn master_prices_file(&self) -> PathBuf {
        self.processed_dir.join("master_monthly_prices.csv")
    }

    pub fn model_dataset_file(&self) -> PathBuf {
        self.processed_dir.join("master_opec_price_model_dataset.csv")
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

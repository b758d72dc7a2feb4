use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the preparation jobs.
#[derive(Error, Debug)]
pub enum PrepError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A frame operation failed: CSV parsing or serialisation, a cast, a
    /// join or an aggregation.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// A source table lacks a column the job depends on.
    #[error("Missing column \"{column}\" in {source_name}")]
    MissingColumn { column: String, source_name: String },

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A transformation left nothing to write.
    #[error("Empty table: {0}")]
    EmptyTable(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PrepError {
    /// Shorthand for [`PrepError::MissingColumn`].
    pub fn missing_column(column: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            source_name: source_name.into(),
        }
    }
}

/// Convenience alias used throughout the prep crates.
pub type Result<T> = std::result::Result<T, PrepError>;

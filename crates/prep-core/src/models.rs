use polars::prelude::*;

use crate::error::{PrepError, Result};

/// Tokens read as missing in every source CSV, besides empty fields.
pub const NA_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "None", "-"];

/// Label used for tables produced by joining several sources.
pub const JOINED_SOURCE: &str = "joined dataset";

/// A loaded or derived frame, tagged with where it came from so that
/// missing-column errors can name the file.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub source_name: String,
    pub df: DataFrame,
}

impl SourceFrame {
    pub fn new(source_name: impl Into<String>, df: DataFrame) -> Self {
        Self {
            source_name: source_name.into(),
            df,
        }
    }

    /// Column names in frame order.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| c.as_str() == name)
    }

    /// Fail with [`PrepError::MissingColumn`] on the first absent name.
    pub fn require<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n.as_ref())) {
            Some(missing) => Err(PrepError::missing_column(
                missing.as_ref(),
                self.source_name.as_str(),
            )),
            None => Ok(()),
        }
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Swap the frame, keeping the source name.
    pub fn with_df(&self, df: DataFrame) -> Self {
        Self::new(self.source_name.clone(), df)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

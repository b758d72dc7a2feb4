//! Core types and transformations for the commodity data-preparation jobs.
//!
//! Holds the error type, the source-tagged frame wrapper, month-end date
//! handling, the polars transformations shared by the price and joiner
//! jobs, log formatting and CLI settings.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{PrepError, Result};

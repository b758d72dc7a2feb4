//! Data jobs for the commodity preparation workspace.
//!
//! Responsible for reading the raw CSV sources, renaming report files,
//! building the master monthly price table, joining it with the sentiment
//! features and writing the processed outputs.

pub mod aggregator;
pub mod joiner;
pub mod pipeline;
pub mod reader;
pub mod renamer;
pub mod writer;

pub use prep_core as core;

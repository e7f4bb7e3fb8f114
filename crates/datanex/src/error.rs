//! Error types for the datanex library.

use std::path::PathBuf;
use thiserror::Error;

use crate::dataset::SnapshotId;

/// Main error type for datanex operations.
///
/// Data-quality conditions (missing columns, too few rows, no text to
/// embed) never surface here; engines report them inside their results.
/// These variants are reserved for bad input and configuration.
#[derive(Debug, Error)]
pub enum DatanexError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Empty file or no data to analyze.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset construction violated the column/row contract.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Unknown deduplication method name.
    #[error("Unknown deduplication method '{0}' (expected exact, fuzzy, semantic or hybrid)")]
    UnknownMethod(String),

    /// Unknown cleaning strategy name.
    #[error("Unknown cleaning strategy '{0}' (expected drop, fill or flag)")]
    UnknownStrategy(String),

    /// Unknown keep policy for duplicate removal.
    #[error("Unknown keep policy '{0}' (expected first, last or none)")]
    UnknownKeepPolicy(String),

    /// Unknown merge strategy for duplicate groups.
    #[error("Unknown merge strategy '{0}' (expected prefer_complete or aggregate)")]
    UnknownMergeStrategy(String),

    /// A report was applied to a dataset other than the one it describes.
    #[error("Report was computed from dataset {expected} but was applied to dataset {found}")]
    StaleReport {
        expected: SnapshotId,
        found: SnapshotId,
    },

    /// Embedding model failed to load or encode.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A numeric routine could not produce a result.
    #[error("Computation failed in {operation}: {detail}")]
    Computation { operation: String, detail: String },
}

/// Result type alias for datanex operations.
pub type Result<T> = std::result::Result<T, DatanexError>;

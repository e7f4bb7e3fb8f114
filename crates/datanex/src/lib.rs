//! Datanex: validation, deduplication and pattern discovery for tabular data.
//!
//! Three independent engines work on an in-memory [`Dataset`]:
//!
//! - **[`Validator`]**: null, outlier, type, range and format checks plus
//!   custom rules, rolled into a weighted quality score; reports drive
//!   cleaning by dropping, filling or flagging invalid rows
//! - **[`Deduplicator`]**: exact, fuzzy, semantic and hybrid duplicate
//!   detection, with removal and merging of the groups found
//! - **[`PatternFinder`]**: correlations, trends, sequences, anomalies,
//!   associations and a principal-component projection
//!
//! Reports are plain serializable data. Reports that drive a transformation
//! remember the dataset they came from and are rejected on any other one.
//!
//! # Example
//!
//! ```no_run
//! use datanex::{Datanex, DedupMethod, KeepPolicy};
//!
//! let datanex = Datanex::new();
//! let (dataset, _source) = datanex.load("customers.csv").unwrap();
//!
//! let report = datanex.validate(&dataset, &[]);
//! println!("Quality score: {:.2}", report.quality_score);
//!
//! let dups = datanex.find_duplicates(&dataset, DedupMethod::Exact);
//! let deduped = datanex
//!     .remove_duplicates(&dataset, &dups, KeepPolicy::First)
//!     .unwrap();
//! println!("{} rows left", deduped.row_count());
//! ```

pub mod config;
pub mod dataset;
pub mod dedup;
pub mod error;
pub mod input;
pub mod patterns;
pub mod stats;
pub mod validation;

mod datanex;

pub use crate::datanex::{AnalysisResult, Datanex};
pub use config::{DatanexConfig, DedupConfig, PatternConfig, ValidatorConfig};
pub use dataset::{Column, ColumnProfile, ColumnType, Dataset, SnapshotId, Value};
pub use dedup::{
    DedupMethod, DeduplicationReport, Deduplicator, EmbeddingModel, KeepPolicy, MergeStrategy,
    SharedEmbedder,
};
pub use error::{DatanexError, Result};
pub use input::{Parser, ParserConfig, SourceMetadata};
pub use patterns::{PatternFinder, PatternReport};
pub use validation::{CleanStrategy, ValidationReport, ValidationRule, Validator};

//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use datanex::{CleanStrategy, DedupMethod, KeepPolicy, MergeStrategy};

/// Datanex: validation, deduplication and pattern discovery for tabular data
#[derive(Parser)]
#[command(name = "datanex")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file overriding engine defaults
    #[arg(short, long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run quality checks and report a quality score
    Validate {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON file with custom validation rules
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Clean invalid rows: drop, fill or flag
        #[arg(long)]
        clean: Option<CleanStrategy>,

        /// Output path for the cleaned data
        #[arg(short, long, requires = "clean")]
        output: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find duplicate rows and optionally remove or merge them
    Dedup {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Detection method: exact, fuzzy, semantic or hybrid
        #[arg(short, long, default_value = "hybrid")]
        method: DedupMethod,

        /// Similarity threshold for semantic matching (0.0-1.0)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Remove duplicates, keeping first, last or none
        #[arg(long, conflicts_with = "merge")]
        keep: Option<KeepPolicy>,

        /// Merge duplicates: prefer_complete or aggregate
        #[arg(long, conflicts_with = "keep")]
        merge: Option<MergeStrategy>,

        /// Output path for the deduplicated data
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Discover correlations, trends, anomalies and associations
    Patterns {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also search for functional dependencies
        #[arg(long)]
        dependencies: bool,

        /// Also summarize numeric distributions
        #[arg(long)]
        distribution: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show inferred column types and statistics
    Profile {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

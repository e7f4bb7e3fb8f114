//! Engine configuration.
//!
//! Every field has a default, so a JSON config file only needs to name the
//! values it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dedup::{DedupMethod, EmbedderConfig};
use crate::error::{DatanexError, Result};

/// Top-level configuration bundling the three engines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatanexConfig {
    /// Validator settings.
    pub validator: ValidatorConfig,
    /// Deduplicator settings.
    pub dedup: DedupConfig,
    /// Pattern finder settings.
    pub patterns: PatternConfig,
}

impl DatanexConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DatanexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.check()?;
        Ok(config)
    }

    /// Reject values no engine can work with.
    pub fn check(&self) -> Result<()> {
        let t = self.dedup.semantic_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(DatanexError::Config(format!(
                "semantic_threshold must be within [0, 1], got {}",
                t
            )));
        }
        if self.patterns.sequence_window == 0 {
            return Err(DatanexError::Config(
                "sequence_window must be at least 1".to_string(),
            ));
        }
        if self.patterns.cluster_components == 0 {
            return Err(DatanexError::Config(
                "cluster_components must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validator limits and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Row indices kept per null finding.
    pub null_index_limit: usize,
    /// Minimum non-null values before outliers are computed.
    pub outlier_min_values: usize,
    /// IQR fence multiplier.
    pub iqr_multiplier: f64,
    /// Outlier values kept per finding.
    pub outlier_sample_limit: usize,
    /// Failure ratio at or above which a text column is treated as text, not mixed.
    pub mixed_type_max_ratio: f64,
    /// Distinct sample values kept per type or pattern finding.
    pub sample_limit: usize,
    /// Row indices kept per custom-rule violation.
    pub rule_index_limit: usize,
    /// Cap on the aggregated invalid row list.
    pub invalid_rows_cap: usize,
    /// Score a dataset must exceed to be considered valid.
    pub valid_threshold: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            null_index_limit: 100,
            outlier_min_values: 4,
            iqr_multiplier: 1.5,
            outlier_sample_limit: 50,
            mixed_type_max_ratio: 0.9,
            sample_limit: 10,
            rule_index_limit: 100,
            invalid_rows_cap: 1000,
            valid_threshold: 0.70,
        }
    }
}

/// Deduplicator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Method used when the caller does not pick one.
    pub method: DedupMethod,
    /// Minimum cosine similarity for semantic duplicates.
    pub semantic_threshold: f64,
    /// Rows considered by the semantic pass.
    pub semantic_row_cap: usize,
    /// Raw variant rows kept per fuzzy group.
    pub fuzzy_variant_limit: usize,
    /// Run a semantic pass after exact and fuzzy in hybrid mode.
    pub hybrid_semantic: bool,
    /// Embedding model behind semantic matching.
    pub embedder: EmbedderConfig,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            method: DedupMethod::Hybrid,
            semantic_threshold: 0.9,
            semantic_row_cap: 1000,
            fuzzy_variant_limit: 5,
            hybrid_semantic: false,
            embedder: EmbedderConfig::default(),
        }
    }
}

/// Pattern finder thresholds and caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Minimum |r| reported as a correlation.
    pub correlation_threshold: f64,
    /// |r| above which a correlation is "strong".
    pub strong_correlation: f64,
    /// Minimum |r| for a trend.
    pub trend_min_r: f64,
    /// p-value below which a trend is significant.
    pub significance_level: f64,
    /// Sliding window length for sequences.
    pub sequence_window: usize,
    /// Sequences kept per column.
    pub sequences_per_column: usize,
    /// |z| above which a value is anomalous.
    pub anomaly_z_threshold: f64,
    /// Minimum values for anomaly and distribution analysis.
    pub min_numeric_values: usize,
    /// Anomalous values kept per column.
    pub anomaly_sample_limit: usize,
    /// Leading text columns considered for associations.
    pub association_max_columns: usize,
    /// Minimum support for an association.
    pub association_min_support: f64,
    /// Associations kept.
    pub association_limit: usize,
    /// Minimum complete rows for clustering.
    pub cluster_min_rows: usize,
    /// Requested projection dimensions.
    pub cluster_components: usize,
    /// Projected points kept.
    pub cluster_point_limit: usize,
    /// Columns scanned for functional dependencies.
    pub dependency_column_cap: usize,
    /// Minimum values for the normality test.
    pub normality_min_values: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.7,
            strong_correlation: 0.9,
            trend_min_r: 0.5,
            significance_level: 0.05,
            sequence_window: 3,
            sequences_per_column: 5,
            anomaly_z_threshold: 3.0,
            min_numeric_values: 4,
            anomaly_sample_limit: 10,
            association_max_columns: 5,
            association_min_support: 0.1,
            association_limit: 20,
            cluster_min_rows: 10,
            cluster_components: 2,
            cluster_point_limit: 100,
            dependency_column_cap: 50,
            normality_min_values: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dedup": {{"semantic_threshold": 0.8, "method": "fuzzy"}}}}"#
        )
        .unwrap();

        let config = DatanexConfig::load(file.path()).unwrap();
        assert_eq!(config.dedup.semantic_threshold, 0.8);
        assert_eq!(config.dedup.method, DedupMethod::Fuzzy);
        assert_eq!(config.dedup.semantic_row_cap, 1000);
        assert_eq!(config.validator.invalid_rows_cap, 1000);
        assert_eq!(config.patterns.sequence_window, 3);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dedup": {{"semantic_threshold": 1.5}}}}"#).unwrap();
        assert!(matches!(
            DatanexConfig::load(file.path()),
            Err(DatanexError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = DatanexConfig::load("/nonexistent/datanex.json");
        assert!(matches!(result, Err(DatanexError::Io { .. })));
    }
}

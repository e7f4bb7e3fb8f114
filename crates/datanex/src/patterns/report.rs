//! Pattern discovery results.

use serde::{Deserialize, Serialize};

use crate::dataset::{SnapshotId, Value};

/// Sign of a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    Positive,
    Negative,
}

/// Magnitude class of a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Strong,
    Moderate,
}

/// Two numeric columns moving together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub column1: String,
    pub column2: String,
    pub correlation: f64,
    #[serde(rename = "type")]
    pub kind: CorrelationType,
    pub strength: Strength,
    /// Rows where both columns are present.
    pub sample_size: usize,
}

/// Direction of a temporal trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

/// Whether a trend's slope is statistically distinguishable from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Significant,
    NotSignificant,
}

/// A numeric column drifting over a temporal column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trend {
    pub column: String,
    pub date_column: String,
    pub trend: TrendDirection,
    pub slope: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub significance: Significance,
}

/// A run of consecutive values repeated within a text column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub column: String,
    pub sequence: Vec<Value>,
    pub count: usize,
}

/// Extreme values in one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub column: String,
    pub method: String,
    pub count: usize,
    /// Anomalous values in row order (capped).
    pub anomaly_values: Vec<f64>,
    pub indices: Vec<usize>,
    pub mean: f64,
    /// Sample standard deviation of the column.
    pub std: f64,
}

/// Two categorical values frequently seen on the same row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    /// `column=value` of the first item.
    pub item1: String,
    pub item2: String,
    pub support: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Principal-component projection of the numeric columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    /// Requested dimensions.
    pub n_components: usize,
    /// Dimensions actually computed.
    pub components_used: usize,
    pub columns: Vec<String>,
    pub rows_used: usize,
    pub explained_variance: Vec<f64>,
    pub total_variance_explained: f64,
    /// Projected coordinates of the leading rows (capped).
    pub principal_components: Vec<Vec<f64>>,
}

/// Outcome of the clustering analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterResult {
    Projected(Projection),
    InsufficientData {
        note: String,
        usable_rows: usize,
        numeric_columns: usize,
    },
    Failed {
        error: String,
    },
}

impl Default for ClusterResult {
    fn default() -> Self {
        ClusterResult::InsufficientData {
            note: "Insufficient data for clustering".to_string(),
            usable_rows: 0,
            numeric_columns: 0,
        }
    }
}

/// Column A determines column B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalDependency {
    pub determinant: String,
    pub dependent: String,
    pub confidence: f64,
}

/// Quartiles by linear interpolation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Shape of one numeric column's distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
    pub quartiles: Quartiles,
    /// D'Agostino-Pearson p-value; absent for small or constant columns.
    pub normality_p_value: Option<f64>,
    pub is_normal: Option<bool>,
}

/// An analysis that could not run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub analysis: String,
    pub detail: String,
}

/// All pattern analyses over one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternReport {
    /// Dataset the report was computed from.
    pub dataset_id: SnapshotId,
    pub correlations: Vec<CorrelationPair>,
    pub trends: Vec<Trend>,
    pub sequences: Vec<Sequence>,
    pub anomalies: Vec<Anomaly>,
    pub associations: Vec<Association>,
    pub clusters: ClusterResult,
    pub degraded: Vec<AnalysisFailure>,
}

impl PatternReport {
    /// Number of individual patterns found, excluding the projection.
    pub fn pattern_count(&self) -> usize {
        self.correlations.len()
            + self.trends.len()
            + self.sequences.len()
            + self.anomalies.len()
            + self.associations.len()
    }
}

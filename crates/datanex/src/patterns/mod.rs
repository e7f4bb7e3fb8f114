//! Statistical pattern discovery.
//!
//! [`PatternFinder::find_patterns`] runs six independent analyses over a
//! dataset: correlations, temporal trends, repeated sequences, anomalies,
//! value associations and a principal-component projection. Each analysis
//! that fails is logged and recorded in [`PatternReport::degraded`] while the
//! others still report.

mod categorical;
mod clusters;
mod dependencies;
mod numeric;
mod report;
mod temporal;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::config::PatternConfig;
use crate::dataset::Dataset;
use crate::error::Result;

pub use report::{
    AnalysisFailure, Anomaly, Association, ClusterResult, CorrelationPair, CorrelationType,
    DistributionSummary, FunctionalDependency, PatternReport, Projection, Quartiles, Sequence,
    Significance, Strength, Trend, TrendDirection,
};

/// Discovers correlations, trends, anomalies and structure in a dataset.
#[derive(Debug, Clone, Default)]
pub struct PatternFinder {
    config: PatternConfig,
}

impl PatternFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Run every analysis. Never fails.
    pub fn find_patterns(&self, dataset: &Dataset) -> PatternReport {
        let mut degraded = Vec::new();

        let correlations = self.run("correlations", dataset, numeric::correlations, &mut degraded);
        let trends = self.run("trends", dataset, temporal::trends, &mut degraded);
        let sequences = self.run("sequences", dataset, categorical::sequences, &mut degraded);
        let anomalies = self.run("anomalies", dataset, numeric::anomalies, &mut degraded);
        let associations =
            self.run("associations", dataset, categorical::associations, &mut degraded);
        let clusters = match clusters::clusters(dataset, &self.config) {
            Ok(result) => result,
            Err(e) => {
                warn!(analysis = "clusters", error = %e, "Analysis failed");
                degraded.push(AnalysisFailure {
                    analysis: "clusters".to_string(),
                    detail: e.to_string(),
                });
                ClusterResult::Failed {
                    error: e.to_string(),
                }
            }
        };

        let report = PatternReport {
            dataset_id: dataset.id(),
            correlations,
            trends,
            sequences,
            anomalies,
            associations,
            clusters,
            degraded,
        };

        info!(
            rows = dataset.row_count(),
            patterns = report.pattern_count(),
            degraded = report.degraded.len(),
            "Pattern discovery complete"
        );
        report
    }

    /// Column pairs where the first determines the second.
    pub fn find_dependencies(&self, dataset: &Dataset) -> Vec<FunctionalDependency> {
        self.run("dependencies", dataset, dependencies::dependencies, &mut Vec::new())
    }

    /// Shape statistics for each numeric column, keyed by column name.
    pub fn analyze_distribution(&self, dataset: &Dataset) -> IndexMap<String, DistributionSummary> {
        self.run("distribution", dataset, numeric::distributions, &mut Vec::new())
    }

    fn run<T: Default>(
        &self,
        analysis: &str,
        dataset: &Dataset,
        f: impl FnOnce(&Dataset, &PatternConfig) -> Result<T>,
        degraded: &mut Vec<AnalysisFailure>,
    ) -> T {
        match f(dataset, &self.config) {
            Ok(found) => found,
            Err(e) => {
                warn!(analysis, error = %e, "Analysis failed; reporting nothing");
                degraded.push(AnalysisFailure {
                    analysis: analysis.to_string(),
                    detail: e.to_string(),
                });
                T::default()
            }
        }
    }
}

//! Main Datanex struct bundling the three engines behind one configuration.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DatanexConfig;
use crate::dataset::{ColumnProfile, Dataset};
use crate::dedup::{
    DedupMethod, DeduplicationReport, Deduplicator, KeepPolicy, MergeStrategy, SharedEmbedder,
};
use crate::error::Result;
use crate::input::{Parser, ParserConfig, SourceMetadata};
use crate::patterns::{DistributionSummary, FunctionalDependency, PatternFinder, PatternReport};
use crate::validation::{CleanStrategy, ValidationReport, ValidationRule, Validator};

/// Everything Datanex can say about one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Metadata about the source file.
    pub source: SourceMetadata,
    /// Per-column profile.
    pub profile: Vec<ColumnProfile>,
    pub validation: ValidationReport,
    pub duplicates: DeduplicationReport,
    pub patterns: PatternReport,
}

/// Entry point combining loading, validation, deduplication and pattern discovery.
pub struct Datanex {
    config: DatanexConfig,
    parser: Parser,
    validator: Validator,
    deduplicator: Deduplicator,
    patterns: PatternFinder,
}

impl Default for Datanex {
    fn default() -> Self {
        Self::new()
    }
}

impl Datanex {
    /// Create an instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(DatanexConfig::default())
    }

    /// Create an instance with custom configuration.
    pub fn with_config(config: DatanexConfig) -> Self {
        Self {
            parser: Parser::new(),
            validator: Validator::with_config(config.validator.clone()),
            deduplicator: Deduplicator::with_config(config.dedup.clone()),
            patterns: PatternFinder::with_config(config.patterns.clone()),
            config,
        }
    }

    /// Use custom parsing options when loading files.
    pub fn with_parser(mut self, config: ParserConfig) -> Self {
        self.parser = Parser::with_config(config);
        self
    }

    /// Use a specific embedding model for semantic deduplication.
    pub fn with_embedder(mut self, embedder: SharedEmbedder) -> Self {
        self.deduplicator = self.deduplicator.with_embedder(embedder);
        self
    }

    pub fn config(&self) -> &DatanexConfig {
        &self.config
    }

    /// Load a delimited file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        self.parser.parse_file(path)
    }

    /// Load a file and run every engine over it with default selectors.
    pub fn analyze(&self, path: impl AsRef<Path>, rules: &[ValidationRule]) -> Result<AnalysisResult> {
        let (dataset, source) = self.load(path)?;

        let result = AnalysisResult {
            profile: dataset.profile(),
            validation: self.validate(&dataset, rules),
            duplicates: self.find_duplicates(&dataset, self.config.dedup.method),
            patterns: self.find_patterns(&dataset),
            source,
        };

        info!(
            file = %result.source.file,
            quality_score = result.validation.quality_score,
            duplicates = result.duplicates.duplicates_found,
            patterns = result.patterns.pattern_count(),
            "Analysis complete"
        );
        Ok(result)
    }

    pub fn validate(&self, dataset: &Dataset, rules: &[ValidationRule]) -> ValidationReport {
        self.validator.validate(dataset, rules)
    }

    pub fn clean(
        &self,
        dataset: &Dataset,
        report: &ValidationReport,
        strategy: CleanStrategy,
    ) -> Result<Dataset> {
        self.validator.clean(dataset, report, strategy)
    }

    pub fn find_duplicates(&self, dataset: &Dataset, method: DedupMethod) -> DeduplicationReport {
        self.deduplicator.find_duplicates(dataset, method)
    }

    pub fn find_duplicates_with_threshold(
        &self,
        dataset: &Dataset,
        method: DedupMethod,
        threshold: f64,
    ) -> Result<DeduplicationReport> {
        self.deduplicator
            .find_duplicates_with_threshold(dataset, method, threshold)
    }

    pub fn remove_duplicates(
        &self,
        dataset: &Dataset,
        report: &DeduplicationReport,
        keep: KeepPolicy,
    ) -> Result<Dataset> {
        self.deduplicator.remove_duplicates(dataset, report, keep)
    }

    pub fn merge_duplicates(
        &self,
        dataset: &Dataset,
        report: &DeduplicationReport,
        strategy: MergeStrategy,
    ) -> Result<Dataset> {
        self.deduplicator.merge_duplicates(dataset, report, strategy)
    }

    pub fn find_patterns(&self, dataset: &Dataset) -> PatternReport {
        self.patterns.find_patterns(dataset)
    }

    pub fn find_dependencies(&self, dataset: &Dataset) -> Vec<FunctionalDependency> {
        self.patterns.find_dependencies(dataset)
    }

    pub fn analyze_distribution(&self, dataset: &Dataset) -> IndexMap<String, DistributionSummary> {
        self.patterns.analyze_distribution(dataset)
    }
}

//! Duplicate detection and resolution.
//!
//! Four interchangeable strategies find groups of duplicate rows:
//!
//! - **exact**: identical values in every column
//! - **fuzzy**: identical after trimming and lower-casing text (SHA-256 of the normalized row)
//! - **semantic**: cosine similarity of embedded text columns
//! - **hybrid**: exact, then fuzzy on the rows exact matching left over
//!
//! A [`DeduplicationReport`] can then be applied with
//! [`Deduplicator::remove_duplicates`] or [`Deduplicator::merge_duplicates`].

mod detect;
mod embedding;
mod report;
mod resolve;

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use crate::config::DedupConfig;
use crate::dataset::Dataset;
use crate::error::{DatanexError, Result};

pub use embedding::{
    EmbedderConfig, EmbeddingModel, HashingEmbedder, OllamaEmbedder, SharedEmbedder,
    cosine_similarity,
};
pub use report::{DedupMethod, DeduplicationReport, DuplicateGroup, GroupEvidence};
pub use resolve::{KeepPolicy, MergeStrategy};

/// Finds and resolves duplicate rows.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    config: DedupConfig,
    embedder: Arc<SharedEmbedder>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    /// Create a deduplicator with default settings and the hashing embedder.
    pub fn new() -> Self {
        Self::with_config(DedupConfig::default())
    }

    /// Create with custom settings. The configured embedder loads on first semantic use.
    pub fn with_config(config: DedupConfig) -> Self {
        let embedder = Arc::new(SharedEmbedder::from_config(config.embedder.clone()));
        Self { config, embedder }
    }

    /// Replace the embedding model.
    pub fn with_embedder(mut self, embedder: SharedEmbedder) -> Self {
        self.embedder = Arc::new(embedder);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Find duplicates with the configured semantic threshold.
    pub fn find_duplicates(&self, dataset: &Dataset, method: DedupMethod) -> DeduplicationReport {
        self.detect(dataset, method, self.config.semantic_threshold)
    }

    /// Find duplicates with a per-call semantic similarity threshold.
    pub fn find_duplicates_with_threshold(
        &self,
        dataset: &Dataset,
        method: DedupMethod,
        threshold: f64,
    ) -> Result<DeduplicationReport> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DatanexError::Config(format!(
                "similarity threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(self.detect(dataset, method, threshold))
    }

    /// Drop the surplus members of every group.
    pub fn remove_duplicates(
        &self,
        dataset: &Dataset,
        report: &DeduplicationReport,
        keep: KeepPolicy,
    ) -> Result<Dataset> {
        resolve::remove_duplicates(dataset, report, keep)
    }

    /// Collapse every group into a single row.
    pub fn merge_duplicates(
        &self,
        dataset: &Dataset,
        report: &DeduplicationReport,
        strategy: MergeStrategy,
    ) -> Result<Dataset> {
        resolve::merge_duplicates(dataset, report, strategy)
    }

    fn detect(&self, dataset: &Dataset, method: DedupMethod, threshold: f64) -> DeduplicationReport {
        let all: Vec<usize> = (0..dataset.row_count()).collect();
        let total = dataset.row_count();

        let report = match method {
            DedupMethod::Exact => {
                DeduplicationReport::new(dataset.id(), method, total, detect::exact_groups(dataset, &all))
            }
            DedupMethod::Fuzzy => DeduplicationReport::new(
                dataset.id(),
                method,
                total,
                detect::fuzzy_groups(dataset, &all, self.config.fuzzy_variant_limit),
            ),
            DedupMethod::Semantic => {
                let (groups, note) = self.semantic_pass(dataset, &all, threshold);
                let mut report = DeduplicationReport::new(dataset.id(), method, total, groups);
                report.threshold = Some(threshold);
                report.note = note;
                report
            }
            DedupMethod::Hybrid => self.hybrid(dataset, &all, threshold),
        };

        info!(
            method = %method,
            rows = total,
            groups = report.groups.len(),
            duplicates = report.duplicates_found,
            "Duplicate search completed"
        );
        report
    }

    fn semantic_pass(
        &self,
        dataset: &Dataset,
        candidates: &[usize],
        threshold: f64,
    ) -> (Vec<DuplicateGroup>, Option<String>) {
        match self.embedder.get() {
            Ok(model) => {
                let outcome = detect::semantic_groups(
                    dataset,
                    candidates,
                    threshold,
                    self.config.semantic_row_cap,
                    model,
                );
                (outcome.groups, outcome.note)
            }
            Err(e) => (Vec::new(), Some(format!("Embedding model unavailable: {}", e))),
        }
    }

    fn hybrid(&self, dataset: &Dataset, all: &[usize], threshold: f64) -> DeduplicationReport {
        let mut breakdown = IndexMap::new();

        let mut groups = detect::exact_groups(dataset, all);
        breakdown.insert("exact".to_string(), count_rows(&groups));

        let remaining = remaining_rows(all, &groups);
        let fuzzy = detect::fuzzy_groups(dataset, &remaining, self.config.fuzzy_variant_limit);
        breakdown.insert("fuzzy".to_string(), count_rows(&fuzzy));
        groups.extend(fuzzy);

        let mut note = None;
        let mut used_threshold = None;
        if self.config.hybrid_semantic {
            let remaining = remaining_rows(all, &groups);
            let (semantic, semantic_note) = self.semantic_pass(dataset, &remaining, threshold);
            breakdown.insert("semantic".to_string(), count_rows(&semantic));
            groups.extend(semantic);
            note = semantic_note;
            used_threshold = Some(threshold);
        }

        let mut report =
            DeduplicationReport::new(dataset.id(), DedupMethod::Hybrid, dataset.row_count(), groups);
        report.breakdown = Some(breakdown);
        report.note = note;
        report.threshold = used_threshold;
        report
    }
}

fn count_rows(groups: &[DuplicateGroup]) -> usize {
    groups.iter().map(DuplicateGroup::len).sum()
}

fn remaining_rows(all: &[usize], groups: &[DuplicateGroup]) -> Vec<usize> {
    let grouped: HashSet<usize> = groups
        .iter()
        .flat_map(|g| g.indices.iter().copied())
        .collect();
    all.iter().copied().filter(|i| !grouped.contains(i)).collect()
}

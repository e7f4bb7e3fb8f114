//! Validation engine: independent quality checks, scoring and cleaning.

mod checks;
mod cleaning;
mod report;
mod rules;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::config::ValidatorConfig;
use crate::dataset::Dataset;
use crate::error::Result;

pub use checks::{NullCheck, OutlierCheck, PatternCheck, QualityCheck, RangeCheck, TypeCheck};
pub use cleaning::{CleanStrategy, VALIDITY_COLUMN};
pub use report::{
    CheckFailure, CheckKind, Finding, NullFinding, OutlierFinding, PatternFinding, RangeFinding,
    RuleViolation, TypeFinding, TypeIssue, ValidationReport, ValidationSummary,
};
pub use rules::ValidationRule;

pub(crate) use cleaning::numeric_value;

/// Runs the quality checks and cleans datasets from their reports.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    /// Create a validator with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with custom limits.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run every check plus any custom rules.
    ///
    /// Never fails: a check that errors is logged, contributes nothing and
    /// is listed in [`ValidationReport::degraded`].
    pub fn validate(&self, dataset: &Dataset, rules: &[ValidationRule]) -> ValidationReport {
        let mut degraded = Vec::new();

        let nulls = self.run_check(&NullCheck, dataset, &mut degraded);
        let outliers = self.run_check(&OutlierCheck, dataset, &mut degraded);
        let type_issues = self.run_check(&TypeCheck, dataset, &mut degraded);
        let range_violations = self.run_check(&RangeCheck, dataset, &mut degraded);
        let pattern_violations = self.run_check(&PatternCheck, dataset, &mut degraded);

        let mut rule_violations = Vec::new();
        for rule in rules {
            match rule.evaluate(dataset, self.config.rule_index_limit) {
                Ok(Some(violation)) => rule_violations.push(violation),
                Ok(None) => {}
                Err(e) => {
                    warn!(rule = %rule.name, error = %e, "Custom rule skipped");
                    degraded.push(CheckFailure {
                        check: CheckKind::Rules,
                        detail: e.to_string(),
                    });
                }
            }
        }

        let mut invalid: BTreeSet<usize> = BTreeSet::new();
        extend_rows(&mut invalid, &nulls);
        extend_rows(&mut invalid, &outliers);
        extend_rows(&mut invalid, &type_issues);
        extend_rows(&mut invalid, &range_violations);
        extend_rows(&mut invalid, &pattern_violations);
        for violation in &rule_violations {
            invalid.extend(violation.rows().iter().copied());
        }
        let invalid_count = invalid.len();
        let invalid_rows: Vec<usize> = invalid
            .into_iter()
            .take(self.config.invalid_rows_cap)
            .collect();

        let total_rows = dataset.row_count();
        let mut report = ValidationReport {
            dataset_id: dataset.id(),
            total_rows,
            total_columns: dataset.column_count(),
            nulls,
            outliers,
            type_issues,
            range_violations,
            pattern_violations,
            rule_violations,
            degraded,
            invalid_rows,
            invalid_count,
            quality_score: 1.0,
            is_valid: true,
            summary: ValidationSummary {
                total_issues: 0,
                invalid_ratio: 0.0,
                quality_score: 1.0,
            },
        };

        let counts: Vec<_> = CheckKind::ALL
            .iter()
            .map(|kind| (*kind, report.issue_count(*kind)))
            .collect();
        let score = report::quality_score(&counts, total_rows);

        report.quality_score = score;
        report.is_valid = score > self.config.valid_threshold;
        report.summary = ValidationSummary {
            total_issues: report.finding_count(),
            invalid_ratio: if total_rows == 0 {
                0.0
            } else {
                invalid_count as f64 / total_rows as f64
            },
            quality_score: score,
        };

        info!(
            rows = total_rows,
            issues = report.summary.total_issues,
            invalid = invalid_count,
            score,
            "Validation completed"
        );

        report
    }

    /// Produce a cleaned copy of `dataset` according to `report`.
    pub fn clean(
        &self,
        dataset: &Dataset,
        report: &ValidationReport,
        strategy: CleanStrategy,
    ) -> Result<Dataset> {
        cleaning::clean(dataset, report, strategy)
    }

    fn run_check<C: QualityCheck>(
        &self,
        check: &C,
        dataset: &Dataset,
        degraded: &mut Vec<CheckFailure>,
    ) -> IndexMap<String, C::Finding> {
        match check.run(dataset, &self.config) {
            Ok(findings) => findings,
            Err(e) => {
                warn!(check = %check.kind(), error = %e, "Check failed; reporting no findings");
                degraded.push(CheckFailure {
                    check: check.kind(),
                    detail: e.to_string(),
                });
                IndexMap::new()
            }
        }
    }
}

fn extend_rows<F: Finding>(invalid: &mut BTreeSet<usize>, findings: &IndexMap<String, F>) {
    for finding in findings.values() {
        invalid.extend(finding.rows().iter().copied());
    }
}

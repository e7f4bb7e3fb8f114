//! Validation findings and the aggregated report.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{SnapshotId, Value};

// =============================================================================
// CHECK KINDS
// =============================================================================

/// The fixed set of checks the validator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Nulls,
    Outliers,
    Types,
    Ranges,
    Patterns,
    Rules,
}

impl CheckKind {
    /// All kinds, in execution order.
    pub const ALL: [CheckKind; 6] = [
        CheckKind::Nulls,
        CheckKind::Outliers,
        CheckKind::Types,
        CheckKind::Ranges,
        CheckKind::Patterns,
        CheckKind::Rules,
    ];

    /// Weight of this check in the quality score. Custom rules are unweighted.
    pub fn weight(&self) -> f64 {
        match self {
            CheckKind::Nulls => 0.30,
            CheckKind::Outliers => 0.20,
            CheckKind::Types => 0.20,
            CheckKind::Ranges => 0.15,
            CheckKind::Patterns => 0.15,
            CheckKind::Rules => 0.0,
        }
    }

    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Nulls => "nulls",
            CheckKind::Outliers => "outliers",
            CheckKind::Types => "types",
            CheckKind::Ranges => "ranges",
            CheckKind::Patterns => "patterns",
            CheckKind::Rules => "rules",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A check (or a single rule) that could not run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFailure {
    pub check: CheckKind,
    pub detail: String,
}

// =============================================================================
// FINDINGS
// =============================================================================

/// Common view over per-column findings used for scoring and row aggregation.
pub trait Finding {
    /// Number of offending values counted toward the quality score.
    fn issue_count(&self) -> usize;
    /// Row indices implicated by this finding.
    fn rows(&self) -> &[usize];
}

/// Missing values in one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullFinding {
    pub count: usize,
    /// Percentage of all rows.
    pub percentage: f64,
    /// First offending row indices (capped).
    pub indices: Vec<usize>,
}

impl Finding for NullFinding {
    fn issue_count(&self) -> usize {
        self.count
    }
    fn rows(&self) -> &[usize] {
        &self.indices
    }
}

/// Values outside the IQR fences of one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierFinding {
    pub count: usize,
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Sample of the outlying values (capped).
    pub values: Vec<f64>,
    pub indices: Vec<usize>,
}

impl Finding for OutlierFinding {
    fn issue_count(&self) -> usize {
        self.count
    }
    fn rows(&self) -> &[usize] {
        &self.indices
    }
}

/// Kind of type inconsistency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeIssue {
    /// Text column where most, but not all, values are numeric.
    MixedNumericText,
    /// Count-like numeric column holding negative values.
    UnexpectedNegativeValues,
}

/// A type inconsistency in one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeFinding {
    pub issue: TypeIssue,
    pub count: usize,
    /// Distinct offending values (capped); empty for negative-value findings.
    pub samples: Vec<Value>,
    pub indices: Vec<usize>,
}

impl Finding for TypeFinding {
    fn issue_count(&self) -> usize {
        self.count
    }
    fn rows(&self) -> &[usize] {
        &self.indices
    }
}

/// Values outside the plausible range for a well-known field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeFinding {
    pub expected_min: f64,
    pub expected_max: f64,
    pub count: usize,
    pub min_found: f64,
    pub max_found: f64,
    pub indices: Vec<usize>,
}

impl Finding for RangeFinding {
    fn issue_count(&self) -> usize {
        self.count
    }
    fn rows(&self) -> &[usize] {
        &self.indices
    }
}

/// Values that do not match the expected format for a well-known field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternFinding {
    /// Name of the expected pattern (email, phone, ...).
    pub expected_pattern: String,
    pub invalid_count: usize,
    /// Percentage of non-null values.
    pub invalid_percentage: f64,
    pub samples: Vec<String>,
    pub indices: Vec<usize>,
}

impl Finding for PatternFinding {
    fn issue_count(&self) -> usize {
        self.invalid_count
    }
    fn rows(&self) -> &[usize] {
        &self.indices
    }
}

/// Rows violating one custom rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: String,
    pub column: String,
    pub count: usize,
    /// First violating row indices (capped).
    pub indices: Vec<usize>,
}

impl Finding for RuleViolation {
    fn issue_count(&self) -> usize {
        self.count
    }
    fn rows(&self) -> &[usize] {
        &self.indices
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// Headline numbers of a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Per-column findings plus rule violations.
    pub total_issues: usize,
    pub invalid_ratio: f64,
    pub quality_score: f64,
}

/// Result of validating one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Dataset the report was computed from.
    pub dataset_id: SnapshotId,
    pub total_rows: usize,
    pub total_columns: usize,
    pub nulls: IndexMap<String, NullFinding>,
    pub outliers: IndexMap<String, OutlierFinding>,
    pub type_issues: IndexMap<String, TypeFinding>,
    pub range_violations: IndexMap<String, RangeFinding>,
    pub pattern_violations: IndexMap<String, PatternFinding>,
    pub rule_violations: Vec<RuleViolation>,
    /// Checks or rules that failed to run.
    pub degraded: Vec<CheckFailure>,
    /// Sorted union of implicated rows (capped).
    pub invalid_rows: Vec<usize>,
    /// Size of the union before capping.
    pub invalid_count: usize,
    pub quality_score: f64,
    pub is_valid: bool,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Total offending values reported by one check.
    pub fn issue_count(&self, kind: CheckKind) -> usize {
        fn sum<F: Finding>(findings: &IndexMap<String, F>) -> usize {
            findings.values().map(Finding::issue_count).sum()
        }
        match kind {
            CheckKind::Nulls => sum(&self.nulls),
            CheckKind::Outliers => sum(&self.outliers),
            CheckKind::Types => sum(&self.type_issues),
            CheckKind::Ranges => sum(&self.range_violations),
            CheckKind::Patterns => sum(&self.pattern_violations),
            CheckKind::Rules => self.rule_violations.iter().map(|v| v.count).sum(),
        }
    }

    /// Number of per-column findings plus rule violations.
    pub fn finding_count(&self) -> usize {
        self.nulls.len()
            + self.outliers.len()
            + self.type_issues.len()
            + self.range_violations.len()
            + self.pattern_violations.len()
            + self.rule_violations.len()
    }
}

/// `1 - Σ weight × issues / rows`, clamped to [0, 1]. An empty dataset scores 1.
pub(crate) fn quality_score(issue_counts: &[(CheckKind, usize)], total_rows: usize) -> f64 {
    if total_rows == 0 {
        return 1.0;
    }
    let penalty: f64 = issue_counts
        .iter()
        .map(|(kind, count)| kind.weight() * *count as f64 / total_rows as f64)
        .sum();
    (1.0 - penalty).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = CheckKind::ALL.iter().map(|k| k.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_clamped_and_monotonic() {
        assert_eq!(quality_score(&[], 10), 1.0);
        assert_eq!(quality_score(&[(CheckKind::Nulls, 100)], 10), 0.0);

        let one = quality_score(&[(CheckKind::Patterns, 1)], 2);
        let two = quality_score(&[(CheckKind::Patterns, 2)], 2);
        assert!((one - 0.925).abs() < 1e-12);
        assert!(two < one);
    }

    #[test]
    fn test_rules_do_not_affect_score() {
        assert_eq!(quality_score(&[(CheckKind::Rules, 5)], 5), 1.0);
    }

    #[test]
    fn test_empty_dataset_scores_one() {
        assert_eq!(quality_score(&[(CheckKind::Nulls, 0)], 0), 1.0);
    }
}

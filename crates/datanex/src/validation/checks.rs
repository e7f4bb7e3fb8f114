//! Column-level quality checks.

use std::collections::HashSet;

use indexmap::IndexMap;
use regex::Regex;

use crate::config::ValidatorConfig;
use crate::dataset::{Dataset, Value, parse_number};
use crate::error::Result;
use crate::stats;

use super::report::{
    CheckKind, NullFinding, OutlierFinding, PatternFinding, RangeFinding, TypeFinding, TypeIssue,
};

/// A single check producing one typed finding per offending column.
pub trait QualityCheck {
    /// Finding type produced for each column.
    type Finding;

    /// Which check this is.
    fn kind(&self) -> CheckKind;

    /// Run the check over the dataset.
    fn run(
        &self,
        dataset: &Dataset,
        config: &ValidatorConfig,
    ) -> Result<IndexMap<String, Self::Finding>>;
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

// =============================================================================
// NULLS
// =============================================================================

/// Counts missing values per column.
pub struct NullCheck;

impl QualityCheck for NullCheck {
    type Finding = NullFinding;

    fn kind(&self) -> CheckKind {
        CheckKind::Nulls
    }

    fn run(
        &self,
        dataset: &Dataset,
        config: &ValidatorConfig,
    ) -> Result<IndexMap<String, NullFinding>> {
        let mut findings = IndexMap::new();

        for (col_idx, column) in dataset.columns().iter().enumerate() {
            let null_rows: Vec<usize> = dataset
                .column_values(col_idx)
                .enumerate()
                .filter(|(_, v)| v.is_null())
                .map(|(i, _)| i)
                .collect();

            if null_rows.is_empty() {
                continue;
            }

            let count = null_rows.len();
            findings.insert(
                column.name.clone(),
                NullFinding {
                    count,
                    percentage: percentage(count, dataset.row_count()),
                    indices: null_rows.into_iter().take(config.null_index_limit).collect(),
                },
            );
        }

        Ok(findings)
    }
}

// =============================================================================
// OUTLIERS
// =============================================================================

/// Flags numeric values outside the Tukey fences.
pub struct OutlierCheck;

impl QualityCheck for OutlierCheck {
    type Finding = OutlierFinding;

    fn kind(&self) -> CheckKind {
        CheckKind::Outliers
    }

    fn run(
        &self,
        dataset: &Dataset,
        config: &ValidatorConfig,
    ) -> Result<IndexMap<String, OutlierFinding>> {
        let mut findings = IndexMap::new();

        for col_idx in dataset.numeric_columns() {
            let values = dataset.numeric_values(col_idx);
            if values.len() < config.outlier_min_values {
                continue;
            }

            let nums: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
            let sorted = stats::sorted(&nums);
            let (Some(q1), Some(q3)) = (
                stats::quantile_sorted(&sorted, 0.25),
                stats::quantile_sorted(&sorted, 0.75),
            ) else {
                continue;
            };
            let iqr = q3 - q1;
            let lower = q1 - config.iqr_multiplier * iqr;
            let upper = q3 + config.iqr_multiplier * iqr;

            let outliers: Vec<(usize, f64)> = values
                .into_iter()
                .filter(|(_, v)| *v < lower || *v > upper)
                .collect();

            if outliers.is_empty() {
                continue;
            }

            let count = outliers.len();
            findings.insert(
                dataset.columns()[col_idx].name.clone(),
                OutlierFinding {
                    count,
                    percentage: percentage(count, dataset.row_count()),
                    lower_bound: lower,
                    upper_bound: upper,
                    values: outliers
                        .iter()
                        .take(config.outlier_sample_limit)
                        .map(|(_, v)| *v)
                        .collect(),
                    indices: outliers.into_iter().map(|(i, _)| i).collect(),
                },
            );
        }

        Ok(findings)
    }
}

// =============================================================================
// TYPE CONSISTENCY
// =============================================================================

/// Column-name fragments that imply a non-negative quantity.
const NON_NEGATIVE_HINTS: &[&str] = &["count", "quantity", "age"];

/// Finds text columns that are mostly numeric and count-like columns with negatives.
pub struct TypeCheck;

impl QualityCheck for TypeCheck {
    type Finding = TypeFinding;

    fn kind(&self) -> CheckKind {
        CheckKind::Types
    }

    fn run(
        &self,
        dataset: &Dataset,
        config: &ValidatorConfig,
    ) -> Result<IndexMap<String, TypeFinding>> {
        let mut findings = IndexMap::new();

        for (col_idx, column) in dataset.columns().iter().enumerate() {
            let finding = if column.column_type.is_text() {
                mixed_numeric_text(dataset, col_idx, config)
            } else if column.column_type.is_numeric() {
                let lower = column.name.to_lowercase();
                if NON_NEGATIVE_HINTS.iter().any(|hint| lower.contains(hint)) {
                    negative_values(dataset, col_idx)
                } else {
                    None
                }
            } else {
                None
            };

            if let Some(finding) = finding {
                findings.insert(column.name.clone(), finding);
            }
        }

        Ok(findings)
    }
}

fn mixed_numeric_text(
    dataset: &Dataset,
    col_idx: usize,
    config: &ValidatorConfig,
) -> Option<TypeFinding> {
    let mut non_null = 0usize;
    let mut failures: Vec<(usize, &Value)> = Vec::new();

    for (row_idx, value) in dataset.column_values(col_idx).enumerate() {
        let Some(text) = value.as_text() else {
            continue;
        };
        non_null += 1;
        if parse_number(text).is_none() {
            failures.push((row_idx, value));
        }
    }

    let count = failures.len();
    if count == 0 || count as f64 >= non_null as f64 * config.mixed_type_max_ratio {
        return None;
    }

    let mut seen = HashSet::new();
    let samples = failures
        .iter()
        .filter(|(_, v)| seen.insert(*v))
        .take(config.sample_limit)
        .map(|(_, v)| (*v).clone())
        .collect();

    Some(TypeFinding {
        issue: TypeIssue::MixedNumericText,
        count,
        samples,
        indices: failures.into_iter().map(|(i, _)| i).collect(),
    })
}

fn negative_values(dataset: &Dataset, col_idx: usize) -> Option<TypeFinding> {
    let negatives: Vec<usize> = dataset
        .numeric_values(col_idx)
        .into_iter()
        .filter(|(_, v)| *v < 0.0)
        .map(|(i, _)| i)
        .collect();

    if negatives.is_empty() {
        return None;
    }

    Some(TypeFinding {
        issue: TypeIssue::UnexpectedNegativeValues,
        count: negatives.len(),
        samples: Vec::new(),
        indices: negatives,
    })
}

// =============================================================================
// RANGES
// =============================================================================

/// Plausible ranges for well-known field names.
const RANGE_RULES: &[(&str, f64, f64)] = &[
    ("age", 0.0, 120.0),
    ("percentage", 0.0, 100.0),
    ("rating", 0.0, 5.0),
    ("score", 0.0, 100.0),
    ("temperature", -100.0, 100.0),
    ("humidity", 0.0, 100.0),
];

/// Range rules whose keyword appears in a column name, in table order.
fn ranges_for(column_name: &str) -> impl Iterator<Item = (f64, f64)> + '_ {
    RANGE_RULES
        .iter()
        .filter(move |(keyword, _, _)| column_name.to_lowercase().contains(keyword))
        .map(|(_, min, max)| (*min, *max))
}

fn range_finding(values: &[(usize, f64)], min: f64, max: f64) -> Option<RangeFinding> {
    let indices: Vec<usize> = values
        .iter()
        .filter(|(_, v)| *v < min || *v > max)
        .map(|(i, _)| *i)
        .collect();
    if indices.is_empty() {
        return None;
    }

    let min_found = values.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max_found = values
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    Some(RangeFinding {
        expected_min: min,
        expected_max: max,
        count: indices.len(),
        min_found,
        max_found,
        indices,
    })
}

/// Flags numeric values outside plausible ranges.
///
/// When several keywords match a column, the last rule in table order that
/// finds violations is reported.
pub struct RangeCheck;

impl QualityCheck for RangeCheck {
    type Finding = RangeFinding;

    fn kind(&self) -> CheckKind {
        CheckKind::Ranges
    }

    fn run(
        &self,
        dataset: &Dataset,
        _config: &ValidatorConfig,
    ) -> Result<IndexMap<String, RangeFinding>> {
        let mut findings = IndexMap::new();

        for col_idx in dataset.numeric_columns() {
            let column = &dataset.columns()[col_idx];
            let values = dataset.numeric_values(col_idx);
            let finding = ranges_for(&column.name)
                .filter_map(|(min, max)| range_finding(&values, min, max))
                .last();
            if let Some(finding) = finding {
                findings.insert(column.name.clone(), finding);
            }
        }

        Ok(findings)
    }
}

// =============================================================================
// PATTERNS
// =============================================================================

/// Format expectations for well-known field names, in match order.
const PATTERNS: &[(&str, &str)] = &[
    ("email", r"^[\w\.-]+@[\w\.-]+\.\w+$"),
    ("phone", r"^\+?1?\d{9,15}$"),
    ("url", r"^https?://[\w\.-]+\.\w+"),
    ("ipv4", r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$"),
    ("credit_card", r"^\d{13,19}$"),
    ("postal_code", r"^\d{5}(-\d{4})?$"),
    (
        "uuid",
        r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
    ),
];

/// Pattern for a column name; the first keyword in table order wins.
fn pattern_for(column_name: &str) -> Option<(&'static str, &'static str)> {
    let lower = column_name.to_lowercase();
    PATTERNS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .copied()
}

/// Flags values that do not match the format implied by the column name.
pub struct PatternCheck;

impl QualityCheck for PatternCheck {
    type Finding = PatternFinding;

    fn kind(&self) -> CheckKind {
        CheckKind::Patterns
    }

    fn run(
        &self,
        dataset: &Dataset,
        config: &ValidatorConfig,
    ) -> Result<IndexMap<String, PatternFinding>> {
        let mut findings = IndexMap::new();

        for (col_idx, column) in dataset.columns().iter().enumerate() {
            let Some((name, pattern)) = pattern_for(&column.name) else {
                continue;
            };
            let regex = Regex::new(pattern)?;

            let mut non_null = 0usize;
            let mut invalid: Vec<(usize, String)> = Vec::new();
            for (row_idx, value) in dataset.column_values(col_idx).enumerate() {
                if value.is_null() {
                    continue;
                }
                non_null += 1;
                let text = value.to_string();
                if !regex.is_match(&text) {
                    invalid.push((row_idx, text));
                }
            }

            if invalid.is_empty() {
                continue;
            }

            let count = invalid.len();
            findings.insert(
                column.name.clone(),
                PatternFinding {
                    expected_pattern: name.to_string(),
                    invalid_count: count,
                    invalid_percentage: percentage(count, non_null),
                    samples: invalid
                        .iter()
                        .take(config.sample_limit)
                        .map(|(_, s)| s.clone())
                        .collect(),
                    indices: invalid.into_iter().map(|(i, _)| i).collect(),
                },
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnType};

    fn config() -> ValidatorConfig {
        ValidatorConfig::default()
    }

    fn ints(name: &str, values: &[i64]) -> Dataset {
        Dataset::new(
            vec![Column::new(name, ColumnType::Integer)],
            values.iter().map(|v| vec![Value::Integer(*v)]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_null_check_caps_indices() {
        let rows = (0..150).map(|_| vec![Value::Null]).collect();
        let ds = Dataset::new(vec![Column::new("x", ColumnType::Unknown)], rows).unwrap();
        let findings = NullCheck.run(&ds, &config()).unwrap();
        let f = &findings["x"];
        assert_eq!(f.count, 150);
        assert_eq!(f.indices.len(), 100);
        assert_eq!(f.percentage, 100.0);
    }

    #[test]
    fn test_outlier_fences() {
        let ds = ints("v", &[1, 2, 3, 4, 100]);
        let findings = OutlierCheck.run(&ds, &config()).unwrap();
        let f = &findings["v"];
        // q1 = 2, q3 = 4, iqr = 2
        assert_eq!(f.lower_bound, -1.0);
        assert_eq!(f.upper_bound, 7.0);
        assert_eq!(f.indices, vec![4]);
        assert_eq!(f.values, vec![100.0]);
    }

    #[test]
    fn test_outliers_need_four_values() {
        let ds = ints("v", &[1, 2, 1000]);
        assert!(OutlierCheck.run(&ds, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_numeric_text() {
        let ds = Dataset::new(
            vec![Column::new("amount", ColumnType::Text)],
            ["1", "2", "3", "n/a-ish", "oops", "oops"]
                .iter()
                .map(|s| vec![Value::from(*s)])
                .collect(),
        )
        .unwrap();
        let findings = TypeCheck.run(&ds, &config()).unwrap();
        let f = &findings["amount"];
        assert_eq!(f.issue, TypeIssue::MixedNumericText);
        assert_eq!(f.count, 3);
        assert_eq!(f.samples, vec![Value::from("n/a-ish"), Value::from("oops")]);
        assert_eq!(f.indices, vec![3, 4, 5]);
    }

    #[test]
    fn test_mixed_ratio_boundary() {
        // ten values with 1 or 2 numbers: 9/10 failures sits on the 90% line
        let column = |numeric: usize| {
            let rows = (0..10)
                .map(|i| {
                    let text = if i < numeric { i.to_string() } else { format!("w{i}") };
                    vec![Value::Text(text)]
                })
                .collect();
            Dataset::new(vec![Column::new("code", ColumnType::Text)], rows).unwrap()
        };

        let at_limit = TypeCheck.run(&column(1), &config()).unwrap();
        assert!(at_limit.is_empty());

        let below = TypeCheck.run(&column(2), &config()).unwrap();
        assert_eq!(below["code"].issue, TypeIssue::MixedNumericText);
        assert_eq!(below["code"].count, 8);
    }

    #[test]
    fn test_pure_text_not_mixed() {
        let ds = Dataset::new(
            vec![Column::new("city", ColumnType::Text)],
            vec![vec![Value::from("Oslo")], vec![Value::from("Lima")]],
        )
        .unwrap();
        assert!(TypeCheck.run(&ds, &config()).unwrap().is_empty());
    }

    #[test]
    fn test_negative_counts() {
        let ds = ints("item_count", &[3, -1, 2]);
        let findings = TypeCheck.run(&ds, &config()).unwrap();
        assert_eq!(findings["item_count"].issue, TypeIssue::UnexpectedNegativeValues);
        assert_eq!(findings["item_count"].indices, vec![1]);
    }

    #[test]
    fn test_range_keywords_in_table_order() {
        let rules = |name| ranges_for(name).collect::<Vec<_>>();
        assert_eq!(rules("Percentage_done"), vec![(0.0, 100.0)]);
        assert_eq!(rules("user_age"), vec![(0.0, 120.0)]);
        assert_eq!(rules("rating_score"), vec![(0.0, 5.0), (0.0, 100.0)]);
        assert!(rules("name").is_empty());

        let ds = ints("age", &[30, 150, -2]);
        let findings = RangeCheck.run(&ds, &config()).unwrap();
        let f = &findings["age"];
        assert_eq!(f.count, 2);
        assert_eq!(f.min_found, -2.0);
        assert_eq!(f.max_found, 150.0);
    }

    #[test]
    fn test_later_violating_range_rule_wins() {
        // percentage flags both values, age only flags 130
        let ds = ints("percentage_age", &[110, 130]);
        let f = &RangeCheck.run(&ds, &config()).unwrap()["percentage_age"];
        assert_eq!((f.expected_min, f.expected_max), (0.0, 120.0));
        assert_eq!(f.count, 1);
        assert_eq!(f.indices, vec![1]);

        // score finds nothing, so the rating violation stands
        let ds = ints("rating_score", &[50, 60]);
        let f = &RangeCheck.run(&ds, &config()).unwrap()["rating_score"];
        assert_eq!((f.expected_min, f.expected_max), (0.0, 5.0));
        assert_eq!(f.count, 2);

        let ds = ints("rating_score", &[3, 150]);
        let f = &RangeCheck.run(&ds, &config()).unwrap()["rating_score"];
        assert_eq!((f.expected_min, f.expected_max), (0.0, 100.0));
        assert_eq!(f.count, 1);
    }

    #[test]
    fn test_pattern_first_keyword_and_match() {
        assert_eq!(pattern_for("contact_email").map(|p| p.0), Some("email"));
        assert_eq!(pattern_for("website_url").map(|p| p.0), Some("url"));

        let ds = Dataset::new(
            vec![Column::new("email", ColumnType::Text)],
            vec![
                vec![Value::from("a@b.com")],
                vec![Value::from("bad")],
                vec![Value::Null],
            ],
        )
        .unwrap();
        let findings = PatternCheck.run(&ds, &config()).unwrap();
        let f = &findings["email"];
        assert_eq!(f.indices, vec![1]);
        assert_eq!(f.invalid_percentage, 50.0);
        assert_eq!(f.samples, vec!["bad".to_string()]);
    }

    #[test]
    fn test_url_is_prefix_match() {
        let ds = Dataset::new(
            vec![Column::new("url", ColumnType::Text)],
            vec![vec![Value::from("https://example.com/path?q=1")]],
        )
        .unwrap();
        assert!(PatternCheck.run(&ds, &config()).unwrap().is_empty());
    }
}

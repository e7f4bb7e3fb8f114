//! User-supplied validation rules.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::dataset::{Dataset, Value};
use crate::error::{DatanexError, Result};

use super::report::RuleViolation;

fn default_rule_name() -> String {
    "unnamed_rule".to_string()
}

/// A custom rule: either a named condition (`not_null`, `unique`) or numeric bounds.
///
/// Bounds are kept as raw JSON so a malformed rule file degrades that one
/// rule instead of failing the whole load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default = "default_rule_name")]
    pub name: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<JsonValue>,
}

impl ValidationRule {
    /// Rule requiring every value to be present.
    pub fn not_null(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::with_condition(name, column, "not_null")
    }

    /// Rule requiring non-null values to be distinct.
    pub fn unique(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::with_condition(name, column, "unique")
    }

    /// Rule bounding numeric values; either side may be open.
    pub fn range(
        name: impl Into<String>,
        column: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            condition: None,
            min: min.map(JsonValue::from),
            max: max.map(JsonValue::from),
        }
    }

    fn with_condition(name: impl Into<String>, column: impl Into<String>, cond: &str) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            condition: Some(cond.to_string()),
            min: None,
            max: None,
        }
    }

    /// Load a JSON array of rules.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DatanexError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Evaluate the rule. `Ok(None)` means the rule does not apply or found nothing.
    pub(crate) fn evaluate(
        &self,
        dataset: &Dataset,
        index_limit: usize,
    ) -> Result<Option<RuleViolation>> {
        let Some(col_idx) = dataset.column_index(&self.column) else {
            return Ok(None);
        };

        let rows: Vec<usize> = match self.condition.as_deref() {
            Some("not_null") => dataset
                .column_values(col_idx)
                .enumerate()
                .filter(|(_, v)| v.is_null())
                .map(|(i, _)| i)
                .collect(),
            Some("unique") => duplicated_rows(dataset, col_idx),
            Some(other) => {
                return Err(DatanexError::Config(format!(
                    "rule '{}' has unknown condition '{}'",
                    self.name, other
                )));
            }
            None if self.min.is_some() || self.max.is_some() => {
                let min = self.bound("min", self.min.as_ref())?;
                let max = self.bound("max", self.max.as_ref())?;
                dataset
                    .numeric_values(col_idx)
                    .into_iter()
                    .filter(|(_, v)| min.is_some_and(|m| *v < m) || max.is_some_and(|m| *v > m))
                    .map(|(i, _)| i)
                    .collect()
            }
            None => {
                return Err(DatanexError::Config(format!(
                    "rule '{}' has neither a condition nor bounds",
                    self.name
                )));
            }
        };

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(RuleViolation {
            rule: self.name.clone(),
            column: self.column.clone(),
            count: rows.len(),
            indices: rows.into_iter().take(index_limit).collect(),
        }))
    }

    fn bound(&self, side: &str, raw: Option<&JsonValue>) -> Result<Option<f64>> {
        match raw {
            None | Some(JsonValue::Null) => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| {
                DatanexError::Config(format!(
                    "rule '{}' has non-numeric {} bound {}",
                    self.name, side, v
                ))
            }),
        }
    }
}

/// Rows whose non-null value occurs more than once.
fn duplicated_rows(dataset: &Dataset, col_idx: usize) -> Vec<usize> {
    let mut counts: HashMap<&Value, usize> = HashMap::new();
    for value in dataset.column_values(col_idx).filter(|v| !v.is_null()) {
        *counts.entry(value).or_insert(0) += 1;
    }
    dataset
        .column_values(col_idx)
        .enumerate()
        .filter(|(_, v)| !v.is_null() && counts.get(v).copied().unwrap_or(0) > 1)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnType};

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                Column::new("code", ColumnType::Text),
                Column::new("qty", ColumnType::Integer),
            ],
            vec![
                vec![Value::from("a"), Value::Integer(5)],
                vec![Value::from("b"), Value::Integer(-1)],
                vec![Value::from("a"), Value::Null],
                vec![Value::Null, Value::Integer(50)],
                vec![Value::Null, Value::Integer(7)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_not_null_rule() {
        let v = ValidationRule::not_null("code_required", "code")
            .evaluate(&dataset(), 100)
            .unwrap()
            .unwrap();
        assert_eq!(v.indices, vec![3, 4]);
    }

    #[test]
    fn test_unique_ignores_nulls() {
        let v = ValidationRule::unique("code_unique", "code")
            .evaluate(&dataset(), 100)
            .unwrap()
            .unwrap();
        assert_eq!(v.indices, vec![0, 2]);
    }

    #[test]
    fn test_range_checks_both_bounds() {
        let v = ValidationRule::range("qty_range", "qty", Some(0.0), Some(10.0))
            .evaluate(&dataset(), 100)
            .unwrap()
            .unwrap();
        assert_eq!(v.indices, vec![1, 3]);
        assert_eq!(v.count, 2);
    }

    #[test]
    fn test_missing_column_is_skipped() {
        let result = ValidationRule::not_null("r", "nope").evaluate(&dataset(), 100);
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_malformed_rules_error() {
        let unknown: ValidationRule =
            serde_json::from_str(r#"{"column": "qty", "condition": "positive"}"#).unwrap();
        assert_eq!(unknown.name, "unnamed_rule");
        assert!(unknown.evaluate(&dataset(), 100).is_err());

        let bad_bound: ValidationRule =
            serde_json::from_str(r#"{"name": "r", "column": "qty", "min": "zero"}"#).unwrap();
        assert!(bad_bound.evaluate(&dataset(), 100).is_err());
    }
}

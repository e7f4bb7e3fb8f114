//! Applying a validation report to produce a cleaned dataset.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{Column, ColumnType, Dataset, Value};
use crate::error::{DatanexError, Result};
use crate::stats;

use super::report::ValidationReport;

/// Name of the column added by [`CleanStrategy::Flag`].
pub const VALIDITY_COLUMN: &str = "is_valid";

/// How to clean invalid data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanStrategy {
    /// Remove every invalid row.
    Drop,
    /// Fill nulls with the column mean (numeric) or mode (everything else).
    Fill,
    /// Keep all rows and add a boolean validity column.
    Flag,
}

impl FromStr for CleanStrategy {
    type Err = DatanexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(CleanStrategy::Drop),
            "fill" => Ok(CleanStrategy::Fill),
            "flag" => Ok(CleanStrategy::Flag),
            _ => Err(DatanexError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for CleanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CleanStrategy::Drop => "drop",
            CleanStrategy::Fill => "fill",
            CleanStrategy::Flag => "flag",
        };
        f.write_str(s)
    }
}

pub(crate) fn clean(
    dataset: &Dataset,
    report: &ValidationReport,
    strategy: CleanStrategy,
) -> Result<Dataset> {
    if report.dataset_id != dataset.id() {
        return Err(DatanexError::StaleReport {
            expected: report.dataset_id,
            found: dataset.id(),
        });
    }

    let cleaned = match strategy {
        CleanStrategy::Drop => {
            let invalid: BTreeSet<usize> = report.invalid_rows.iter().copied().collect();
            dataset.without_rows(&invalid)?
        }
        CleanStrategy::Fill => fill_nulls(dataset, report)?,
        CleanStrategy::Flag => flag_invalid(dataset, report)?,
    };

    info!(
        strategy = %strategy,
        before = dataset.row_count(),
        after = cleaned.row_count(),
        "Cleaned dataset"
    );

    Ok(cleaned)
}

fn fill_nulls(dataset: &Dataset, report: &ValidationReport) -> Result<Dataset> {
    let mut columns = dataset.columns().to_vec();
    let mut rows = dataset.rows().to_vec();

    for name in report.nulls.keys() {
        let Some(col_idx) = dataset.column_index(name) else {
            continue;
        };
        let Some(fill) = fill_value(dataset, col_idx) else {
            continue;
        };

        if let (ColumnType::Integer, Value::Float(_)) = (columns[col_idx].column_type, &fill) {
            columns[col_idx].column_type = ColumnType::Float;
        }

        for row in rows.iter_mut() {
            if row[col_idx].is_null() {
                row[col_idx] = fill.clone();
            }
        }
    }

    dataset.derive(columns, rows)
}

/// Mean for numeric columns (kept integral when it is), mode otherwise.
pub(crate) fn fill_value(dataset: &Dataset, col_idx: usize) -> Option<Value> {
    let column_type = dataset.columns()[col_idx].column_type;
    if column_type.is_numeric() {
        let values: Vec<f64> = dataset
            .numeric_values(col_idx)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let mean = stats::mean(&values)?;
        Some(numeric_value(column_type, mean))
    } else {
        stats::mode(dataset.column_values(col_idx).filter(|v| !v.is_null())).cloned()
    }
}

/// Value for a numeric result, staying an integer only when nothing is lost.
pub(crate) fn numeric_value(column_type: ColumnType, v: f64) -> Value {
    if column_type == ColumnType::Integer && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Value::Integer(v as i64)
    } else {
        Value::Float(v)
    }
}

fn flag_invalid(dataset: &Dataset, report: &ValidationReport) -> Result<Dataset> {
    let invalid: BTreeSet<usize> = report.invalid_rows.iter().copied().collect();
    let mut columns = dataset.columns().to_vec();
    let existing = dataset.column_index(VALIDITY_COLUMN);

    if let Some(idx) = existing {
        columns[idx].column_type = ColumnType::Boolean;
    } else {
        columns.push(Column::new(VALIDITY_COLUMN, ColumnType::Boolean));
    }

    let rows = dataset
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut row = row.clone();
            let flag = Value::Boolean(!invalid.contains(&i));
            match existing {
                Some(idx) => row[idx] = flag,
                None => row.push(flag),
            }
            row
        })
        .collect();

    dataset.derive(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("drop".parse::<CleanStrategy>().unwrap(), CleanStrategy::Drop);
        assert_eq!(" Fill ".parse::<CleanStrategy>().unwrap(), CleanStrategy::Fill);
        assert!(matches!(
            "purge".parse::<CleanStrategy>(),
            Err(DatanexError::UnknownStrategy(s)) if s == "purge"
        ));
    }

    #[test]
    fn test_numeric_value_keeps_integers() {
        assert_eq!(numeric_value(ColumnType::Integer, 4.0), Value::Integer(4));
        assert_eq!(numeric_value(ColumnType::Integer, 4.5), Value::Float(4.5));
        assert_eq!(numeric_value(ColumnType::Float, 4.0), Value::Float(4.0));
    }
}

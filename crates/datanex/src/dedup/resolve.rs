//! Removing or merging detected duplicate groups.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{ColumnType, Dataset, Value};
use crate::error::{DatanexError, Result};
use crate::stats;
use crate::validation::numeric_value;

use super::report::DeduplicationReport;

/// Which members of a duplicate group survive removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepPolicy {
    /// Keep the first member in dataset order.
    #[default]
    First,
    /// Keep the last member in dataset order.
    Last,
    /// Drop every member.
    None,
}

impl FromStr for KeepPolicy {
    type Err = DatanexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(KeepPolicy::First),
            "last" => Ok(KeepPolicy::Last),
            "none" => Ok(KeepPolicy::None),
            _ => Err(DatanexError::UnknownKeepPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeepPolicy::First => "first",
            KeepPolicy::Last => "last",
            KeepPolicy::None => "none",
        })
    }
}

/// How a duplicate group collapses into one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Start from the most complete member and backfill its nulls.
    #[default]
    PreferComplete,
    /// Mean of numeric columns, mode of the rest.
    Aggregate,
}

impl FromStr for MergeStrategy {
    type Err = DatanexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "prefer_complete" => Ok(MergeStrategy::PreferComplete),
            "aggregate" => Ok(MergeStrategy::Aggregate),
            _ => Err(DatanexError::UnknownMergeStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeStrategy::PreferComplete => "prefer_complete",
            MergeStrategy::Aggregate => "aggregate",
        })
    }
}

fn ensure_current(dataset: &Dataset, report: &DeduplicationReport) -> Result<()> {
    if report.dataset_id != dataset.id() {
        return Err(DatanexError::StaleReport {
            expected: report.dataset_id,
            found: dataset.id(),
        });
    }
    Ok(())
}

pub(crate) fn remove_duplicates(
    dataset: &Dataset,
    report: &DeduplicationReport,
    keep: KeepPolicy,
) -> Result<Dataset> {
    ensure_current(dataset, report)?;

    let mut to_drop = BTreeSet::new();
    for group in &report.groups {
        let kept = match keep {
            KeepPolicy::First => group.indices.first().copied(),
            KeepPolicy::Last => group.indices.last().copied(),
            KeepPolicy::None => None,
        };
        to_drop.extend(group.indices.iter().copied().filter(|&i| Some(i) != kept));
    }

    let result = dataset.without_rows(&to_drop)?;
    info!(
        keep = %keep,
        removed = to_drop.len(),
        remaining = result.row_count(),
        "Removed duplicates"
    );
    Ok(result)
}

pub(crate) fn merge_duplicates(
    dataset: &Dataset,
    report: &DeduplicationReport,
    strategy: MergeStrategy,
) -> Result<Dataset> {
    ensure_current(dataset, report)?;

    let mut columns = dataset.columns().to_vec();
    let mut rows: Vec<Option<Vec<Value>>> = dataset.rows().iter().cloned().map(Some).collect();

    for group in &report.groups {
        if group.indices.len() < 2 {
            continue;
        }
        let members: Vec<&[Value]> = group
            .indices
            .iter()
            .map(|&i| dataset.rows()[i].as_slice())
            .collect();

        let (target, merged) = match strategy {
            MergeStrategy::PreferComplete => prefer_complete(&group.indices, &members),
            MergeStrategy::Aggregate => (group.indices[0], aggregate(dataset, &members)),
        };

        for (col, value) in merged.iter().enumerate() {
            if columns[col].column_type == ColumnType::Integer && matches!(value, Value::Float(_)) {
                columns[col].column_type = ColumnType::Float;
            }
        }

        for &i in &group.indices {
            rows[i] = None;
        }
        rows[target] = Some(merged);
    }

    let kept: Vec<(usize, Vec<Value>)> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(pos, row)| row.map(|r| (pos, r)))
        .collect();

    let result = dataset.derive_subset(columns, kept)?;
    info!(
        strategy = %strategy,
        groups = report.groups.len(),
        remaining = result.row_count(),
        "Merged duplicates"
    );
    Ok(result)
}

/// Base is the member with the fewest nulls (first on ties); its nulls are
/// backfilled from the first other member holding a value.
fn prefer_complete(indices: &[usize], members: &[&[Value]]) -> (usize, Vec<Value>) {
    let null_count = |row: &[Value]| row.iter().filter(|v| v.is_null()).count();
    let mut base = 0;
    for (i, row) in members.iter().enumerate().skip(1) {
        if null_count(*row) < null_count(members[base]) {
            base = i;
        }
    }

    let mut merged = members[base].to_vec();
    for (col, value) in merged.iter_mut().enumerate() {
        if !value.is_null() {
            continue;
        }
        if let Some(fill) = members
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != base)
            .map(|(_, row)| &row[col])
            .find(|v| !v.is_null())
        {
            *value = fill.clone();
        }
    }

    (indices[base], merged)
}

/// Per column: mean of non-null numeric values, mode of non-null others.
fn aggregate(dataset: &Dataset, members: &[&[Value]]) -> Vec<Value> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(col, column)| {
            if column.column_type.is_numeric() {
                let values: Vec<f64> = members.iter().filter_map(|r| r[col].as_f64()).collect();
                match stats::mean(&values) {
                    Some(mean) => numeric_value(column.column_type, mean),
                    None => Value::Null,
                }
            } else {
                stats::mode(members.iter().map(|r| &r[col]).filter(|v| !v.is_null()))
                    .cloned()
                    .unwrap_or(Value::Null)
            }
        })
        .collect()
}

//! Per-column profiles.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::table::Dataset;
use super::types::{ColumnType, SemanticType, Value};

/// Summary of one column's completeness and cardinality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Scalar type of the column.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Number of null values.
    pub null_count: usize,
    /// Fraction of rows that are null (0.0-1.0).
    pub null_ratio: f64,
    /// Number of distinct non-null values.
    pub distinct_count: usize,
    /// Distinct non-null values over total rows (0.0-1.0).
    pub cardinality_ratio: f64,
    /// Inferred semantic type.
    pub semantic_type: SemanticType,
}

impl Dataset {
    /// Profile every column.
    pub fn profile(&self) -> Vec<ColumnProfile> {
        (0..self.column_count())
            .map(|idx| profile_column(self, idx))
            .collect()
    }
}

fn profile_column(dataset: &Dataset, index: usize) -> ColumnProfile {
    let column = &dataset.columns()[index];
    let total = dataset.row_count();

    let mut null_count = 0;
    let mut distinct: HashSet<&Value> = HashSet::new();
    for value in dataset.column_values(index) {
        if value.is_null() {
            null_count += 1;
        } else {
            distinct.insert(value);
        }
    }

    let non_null = total - null_count;
    let ratio = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };

    let semantic_type = infer_semantic_type(column.column_type, non_null, &distinct);

    ColumnProfile {
        name: column.name.clone(),
        column_type: column.column_type,
        null_count,
        null_ratio: ratio(null_count),
        distinct_count: distinct.len(),
        cardinality_ratio: ratio(distinct.len()),
        semantic_type,
    }
}

fn infer_semantic_type(
    column_type: ColumnType,
    non_null: usize,
    distinct: &HashSet<&Value>,
) -> SemanticType {
    if non_null == 0 {
        return SemanticType::Unknown;
    }
    if column_type.is_temporal() {
        return SemanticType::Temporal;
    }
    if distinct.len() == 2 {
        return SemanticType::Binary;
    }

    let all_unique = distinct.len() == non_null && non_null > 1;

    match column_type {
        ColumnType::Integer | ColumnType::Text if all_unique => SemanticType::Identifier,
        ColumnType::Integer => {
            let non_negative = distinct
                .iter()
                .all(|v| v.as_f64().map(|n| n >= 0.0).unwrap_or(false));
            if non_negative {
                SemanticType::Count
            } else {
                SemanticType::Continuous
            }
        }
        ColumnType::Float => SemanticType::Continuous,
        ColumnType::Boolean => SemanticType::Binary,
        ColumnType::Text => {
            // Low ratio of unique values suggests categories
            let unique_ratio = distinct.len() as f64 / non_null as f64;
            if unique_ratio <= 0.5 {
                SemanticType::Categorical
            } else {
                SemanticType::FreeText
            }
        }
        _ => SemanticType::Unknown,
    }
}

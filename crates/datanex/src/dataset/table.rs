//! In-memory tabular dataset shared by every engine.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DatanexError, Result};

use super::types::{ColumnType, Value};

/// Identity of one dataset snapshot.
///
/// Every dataset gets a fresh id when it is built, including datasets
/// derived by cleaning or deduplication. Reports remember the id of the
/// dataset they were computed from, so row indices are never applied to
/// a different snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(u64);

impl SnapshotId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        SnapshotId(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ds_{:04}", self.0)
    }
}

/// Name and scalar type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered rows of typed values under named, typed columns.
///
/// A dataset is immutable once built. Operations that change data return
/// a new dataset with a new [`SnapshotId`]. Each row keeps the label it had
/// in the dataset it was first loaded into, so derived rows can be traced
/// back to their source.
#[derive(Debug, Clone)]
pub struct Dataset {
    id: SnapshotId,
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    labels: Vec<usize>,
}

impl Dataset {
    /// Build a dataset, checking row widths and value types.
    ///
    /// Float NaN cells become nulls. Integer values in a float column are
    /// widened to floats.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let labels = (0..rows.len()).collect();
        Self::from_parts(columns, rows, labels)
    }

    /// Build a dataset from raw parts, keeping caller-supplied row labels.
    pub(crate) fn from_parts(
        columns: Vec<Column>,
        mut rows: Vec<Vec<Value>>,
        labels: Vec<usize>,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatanexError::Schema(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        for (row_idx, row) in rows.iter_mut().enumerate() {
            if row.len() != columns.len() {
                return Err(DatanexError::Schema(format!(
                    "row {} has {} values but the dataset has {} columns",
                    row_idx,
                    row.len(),
                    columns.len()
                )));
            }
            for (value, column) in row.iter_mut().zip(&columns) {
                if matches!(value, Value::Float(v) if v.is_nan()) {
                    *value = Value::Null;
                }
                if !column.column_type.accepts(value) {
                    return Err(DatanexError::Schema(format!(
                        "row {} column '{}': value {:?} does not fit type {:?}",
                        row_idx, column.name, value, column.column_type
                    )));
                }
                if column.column_type == ColumnType::Float {
                    if let Value::Integer(v) = *value {
                        *value = Value::Float(v as f64);
                    }
                }
            }
        }

        Ok(Self {
            id: SnapshotId::next(),
            columns,
            rows,
            labels,
        })
    }

    /// Snapshot id of this dataset.
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    /// Column definitions in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// A single row.
    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    /// Source labels of every row.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Non-null numeric values of a column, paired with their row index.
    pub fn numeric_values(&self, index: usize) -> Vec<(usize, f64)> {
        self.column_values(index)
            .enumerate()
            .filter_map(|(row_idx, v)| v.as_f64().map(|n| (row_idx, n)))
            .collect()
    }

    /// Indices of numeric columns.
    pub fn numeric_columns(&self) -> Vec<usize> {
        self.columns_where(|t| t.is_numeric())
    }

    /// Indices of text (categorical/free-text) columns.
    pub fn text_columns(&self) -> Vec<usize> {
        self.columns_where(|t| t.is_text())
    }

    /// Indices of temporal columns.
    pub fn temporal_columns(&self) -> Vec<usize> {
        self.columns_where(|t| t.is_temporal())
    }

    fn columns_where(&self, pred: impl Fn(&ColumnType) -> bool) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(&c.column_type))
            .map(|(i, _)| i)
            .collect()
    }

    /// A row as an ordered column-name → value map.
    pub fn row_map(&self, index: usize) -> IndexMap<String, Value> {
        self.columns
            .iter()
            .zip(&self.rows[index])
            .map(|(c, v)| (c.name.clone(), v.clone()))
            .collect()
    }

    /// New dataset keeping only the rows whose positions are not in `drop`.
    pub(crate) fn without_rows(&self, drop: &BTreeSet<usize>) -> Result<Self> {
        let mut rows = Vec::with_capacity(self.rows.len().saturating_sub(drop.len()));
        let mut labels = Vec::with_capacity(rows.capacity());
        for (idx, (row, label)) in self.rows.iter().zip(&self.labels).enumerate() {
            if !drop.contains(&idx) {
                rows.push(row.clone());
                labels.push(*label);
            }
        }
        Self::from_parts(self.columns.clone(), rows, labels)
    }

    /// New dataset with the same rows and labels but replacement contents.
    pub(crate) fn derive(&self, columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        Self::from_parts(columns, rows, self.labels.clone())
    }

    /// New dataset from a subset of rows given as `(position, row)` pairs.
    ///
    /// Labels are taken from the referenced positions in this dataset.
    pub(crate) fn derive_subset(
        &self,
        columns: Vec<Column>,
        rows: Vec<(usize, Vec<Value>)>,
    ) -> Result<Self> {
        let labels = rows.iter().map(|(pos, _)| self.labels[*pos]).collect();
        let rows = rows.into_iter().map(|(_, r)| r).collect();
        Self::from_parts(columns, rows, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id", ColumnType::Integer),
                Column::new("score", ColumnType::Float),
            ],
            vec![
                vec![Value::Integer(1), Value::Integer(10)],
                vec![Value::Integer(2), Value::Null],
                vec![Value::Integer(3), Value::Float(7.5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_integer_widened_in_float_column() {
        let ds = sample();
        assert_eq!(ds.get(0, 1), Some(&Value::Float(10.0)));
    }

    #[test]
    fn test_nan_cells_become_null() {
        let ds = Dataset::new(
            vec![Column::new("v", ColumnType::Float)],
            vec![vec![Value::Float(f64::NAN)], vec![Value::Float(1.5)]],
        )
        .unwrap();
        assert_eq!(ds.get(0, 0), Some(&Value::Null));
        assert_eq!(ds.get(1, 0), Some(&Value::Float(1.5)));
        assert_eq!(ds.numeric_values(0), vec![(1, 1.5)]);
    }

    #[test]
    fn test_row_width_mismatch_rejected() {
        let result = Dataset::new(
            vec![Column::new("a", ColumnType::Integer)],
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        assert!(matches!(result, Err(DatanexError::Schema(_))));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let result = Dataset::new(
            vec![Column::new("a", ColumnType::Integer)],
            vec![vec![Value::from("x")]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Dataset::new(
            vec![
                Column::new("a", ColumnType::Integer),
                Column::new("a", ColumnType::Text),
            ],
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_without_rows_keeps_labels_and_new_id() {
        let ds = sample();
        let derived = ds.without_rows(&BTreeSet::from([1])).unwrap();
        assert_eq!(derived.row_count(), 2);
        assert_eq!(derived.labels(), &[0, 2]);
        assert_ne!(derived.id(), ds.id());
    }

    #[test]
    fn test_numeric_values_skip_nulls() {
        let ds = sample();
        assert_eq!(ds.numeric_values(1), vec![(0, 10.0), (2, 7.5)]);
    }
}

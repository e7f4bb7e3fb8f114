//! Column type inference for raw string cells.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;

use super::table::{Column, Dataset};
use super::types::{ColumnType, Value};

/// Datetime layouts tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only layouts tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Check if a value represents a missing/null value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Coerce a string to a finite number, if it is one.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parse a date or datetime in one of the supported layouts.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Infer the narrowest type that every non-null cell satisfies.
fn infer_column_type(cells: &[&str]) -> ColumnType {
    let present: Vec<&str> = cells
        .iter()
        .copied()
        .filter(|c| !is_null_token(c))
        .collect();

    if present.is_empty() {
        return ColumnType::Unknown;
    }
    if present.iter().all(|c| parse_boolean(c).is_some()) {
        return ColumnType::Boolean;
    }
    if present.iter().all(|c| c.trim().parse::<i64>().is_ok()) {
        return ColumnType::Integer;
    }
    if present.iter().all(|c| parse_number(c).is_some()) {
        return ColumnType::Float;
    }
    if present.iter().all(|c| parse_datetime(c).is_some()) {
        return ColumnType::DateTime;
    }
    ColumnType::Text
}

fn convert_cell(cell: &str, column_type: ColumnType) -> Value {
    if is_null_token(cell) {
        return Value::Null;
    }
    let trimmed = cell.trim();
    match column_type {
        ColumnType::Boolean => parse_boolean(trimmed).map(Value::Boolean).unwrap_or(Value::Null),
        ColumnType::Integer => trimmed.parse::<i64>().map(Value::Integer).unwrap_or(Value::Null),
        ColumnType::Float => parse_number(trimmed).map(Value::Float).unwrap_or(Value::Null),
        ColumnType::DateTime => parse_datetime(trimmed).map(Value::DateTime).unwrap_or(Value::Null),
        ColumnType::Text => Value::Text(cell.to_string()),
        ColumnType::Unknown => Value::Null,
    }
}

impl Dataset {
    /// Build a dataset from string cells, inferring one type per column.
    ///
    /// Null-like tokens (`""`, `NA`, `null`, ...) become [`Value::Null`].
    /// Text cells keep their original spacing.
    pub fn from_strings(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut columns = Vec::with_capacity(headers.len());
        for (idx, name) in headers.into_iter().enumerate() {
            let cells: Vec<&str> = rows
                .iter()
                .map(|r| r.get(idx).map(String::as_str).unwrap_or(""))
                .collect();
            columns.push(Column::new(name, infer_column_type(&cells)));
        }

        let typed_rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        let cell = row.get(idx).map(String::as_str).unwrap_or("");
                        convert_cell(cell, col.column_type)
                    })
                    .collect()
            })
            .collect();

        Dataset::new(columns, typed_rows)
    }
}

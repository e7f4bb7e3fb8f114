//! Linear trends of numeric columns over temporal columns.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::config::PatternConfig;
use crate::dataset::Dataset;
use crate::error::{DatanexError, Result};
use crate::stats;

use super::report::{Significance, Trend, TrendDirection};

/// Two-sided p-value of the slope under Student's t with `n - 2` degrees of freedom.
fn slope_p_value(r: f64, n: usize) -> Result<f64> {
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| DatanexError::Computation {
        operation: "trend significance".to_string(),
        detail: e.to_string(),
    })?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Row positions ordered by the temporal column, nulls last, ties stable.
fn temporal_order(dataset: &Dataset, date_col: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..dataset.row_count()).collect();
    order.sort_by_key(|&row| {
        let dt = dataset.rows()[row][date_col].as_datetime();
        (dt.is_none(), dt)
    });
    order
}

/// Forward-fill gaps, then zero-fill any leading ones.
fn filled_series(dataset: &Dataset, order: &[usize], col: usize) -> Vec<f64> {
    let mut last = None;
    order
        .iter()
        .map(|&row| {
            if let Some(v) = dataset.rows()[row][col].as_f64() {
                last = Some(v);
            }
            last.unwrap_or(0.0)
        })
        .collect()
}

pub(crate) fn trends(dataset: &Dataset, config: &PatternConfig) -> Result<Vec<Trend>> {
    let n = dataset.row_count();
    if n < 3 {
        return Ok(Vec::new());
    }

    let numeric = dataset.numeric_columns();
    let mut found = Vec::new();

    for date_col in dataset.temporal_columns() {
        let order = temporal_order(dataset, date_col);
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();

        for &col in &numeric {
            let y = filled_series(dataset, &order, col);
            let Some(fit) = stats::linear_regression(&x, &y) else {
                continue;
            };
            if fit.r.abs() <= config.trend_min_r {
                continue;
            }

            let p_value = slope_p_value(fit.r, n)?;
            found.push(Trend {
                column: dataset.columns()[col].name.clone(),
                date_column: dataset.columns()[date_col].name.clone(),
                trend: if fit.slope > 0.0 {
                    TrendDirection::Increasing
                } else {
                    TrendDirection::Decreasing
                },
                slope: fit.slope,
                r_squared: fit.r * fit.r,
                p_value,
                significance: if p_value < config.significance_level {
                    Significance::Significant
                } else {
                    Significance::NotSignificant
                },
            });
        }
    }

    Ok(found)
}

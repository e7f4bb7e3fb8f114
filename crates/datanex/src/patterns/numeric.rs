//! Correlations, anomalies and distribution shape of numeric columns.

use indexmap::IndexMap;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::warn;

use crate::config::PatternConfig;
use crate::dataset::Dataset;
use crate::error::{DatanexError, Result};
use crate::stats;

use super::report::{
    Anomaly, CorrelationPair, CorrelationType, DistributionSummary, Quartiles, Strength,
};

// =============================================================================
// CORRELATIONS
// =============================================================================

/// Pearson correlation over every pair of numeric columns, pairwise complete.
pub(crate) fn correlations(
    dataset: &Dataset,
    config: &PatternConfig,
) -> Result<Vec<CorrelationPair>> {
    let numeric = dataset.numeric_columns();
    let mut pairs = Vec::new();

    for (a_pos, &a) in numeric.iter().enumerate() {
        for &b in &numeric[a_pos + 1..] {
            let (xs, ys): (Vec<f64>, Vec<f64>) = dataset
                .rows()
                .iter()
                .filter_map(|row| Some((row[a].as_f64()?, row[b].as_f64()?)))
                .unzip();

            let Some(r) = stats::pearson(&xs, &ys) else {
                continue;
            };
            if r.abs() < config.correlation_threshold {
                continue;
            }

            pairs.push(CorrelationPair {
                column1: dataset.columns()[a].name.clone(),
                column2: dataset.columns()[b].name.clone(),
                correlation: r,
                kind: if r > 0.0 {
                    CorrelationType::Positive
                } else {
                    CorrelationType::Negative
                },
                strength: if r.abs() > config.strong_correlation {
                    Strength::Strong
                } else {
                    Strength::Moderate
                },
                sample_size: xs.len(),
            });
        }
    }

    Ok(pairs)
}

// =============================================================================
// ANOMALIES
// =============================================================================

/// Leave-one-out z-score of each value against the rest of the column.
///
/// Scoring a value against statistics that include it caps |z| at
/// `(n - 1) / sqrt(n)`, which hides extreme values in short columns.
fn leave_one_out_z(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let Some(mean) = stats::mean(values) else {
        return Vec::new();
    };
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();

    values
        .iter()
        .map(|&x| {
            let d = x - mean;
            let rest_mean = mean - d / (n - 1.0);
            let rest_ss = (ss - d * d * n / (n - 1.0)).max(0.0);
            let rest_std = (rest_ss / (n - 1.0)).sqrt();
            let dev = x - rest_mean;
            if rest_std <= f64::EPSILON * mean.abs().max(1.0) {
                if dev.abs() <= f64::EPSILON * mean.abs().max(1.0) {
                    0.0
                } else {
                    f64::INFINITY
                }
            } else {
                dev / rest_std
            }
        })
        .collect()
}

/// Values whose |z| exceeds the threshold, per numeric column.
pub(crate) fn anomalies(dataset: &Dataset, config: &PatternConfig) -> Result<Vec<Anomaly>> {
    let mut found = Vec::new();

    for col in dataset.numeric_columns() {
        let values = dataset.numeric_values(col);
        if values.len() < config.min_numeric_values {
            continue;
        }
        let nums: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
        let z = leave_one_out_z(&nums);

        let flagged: Vec<(usize, f64)> = values
            .iter()
            .zip(&z)
            .filter(|(_, z)| z.abs() > config.anomaly_z_threshold)
            .map(|((row, v), _)| (*row, *v))
            .collect();

        if flagged.is_empty() {
            continue;
        }

        found.push(Anomaly {
            column: dataset.columns()[col].name.clone(),
            method: "z_score".to_string(),
            count: flagged.len(),
            anomaly_values: flagged
                .iter()
                .take(config.anomaly_sample_limit)
                .map(|(_, v)| *v)
                .collect(),
            indices: flagged.iter().map(|(i, _)| *i).collect(),
            mean: stats::mean(&nums).unwrap_or(0.0),
            std: stats::sample_std(&nums).unwrap_or(0.0),
        });
    }

    Ok(found)
}

// =============================================================================
// DISTRIBUTION
// =============================================================================

/// Moments, quartiles and a normality test per numeric column.
pub(crate) fn distributions(
    dataset: &Dataset,
    config: &PatternConfig,
) -> Result<IndexMap<String, DistributionSummary>> {
    let mut out = IndexMap::new();

    for col in dataset.numeric_columns() {
        let nums: Vec<f64> = dataset
            .numeric_values(col)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        if nums.len() < config.min_numeric_values {
            continue;
        }

        let sorted = stats::sorted(&nums);
        let quantile = |q| stats::quantile_sorted(&sorted, q).unwrap_or(f64::NAN);
        let std = stats::sample_std(&nums).unwrap_or(0.0);

        let shape = Shape::of(&nums);

        let name = &dataset.columns()[col].name;
        let p_value = if nums.len() >= config.normality_min_values && std > 0.0 {
            normality_p_value(&nums)
                .inspect_err(|e| warn!(column = %name, error = %e, "Normality test skipped"))
                .ok()
        } else {
            None
        };

        out.insert(
            name.clone(),
            DistributionSummary {
                count: nums.len(),
                mean: stats::mean(&nums).unwrap_or(0.0),
                median: stats::median(&nums).unwrap_or(f64::NAN),
                std,
                skewness: shape.skewness,
                kurtosis: shape.excess_kurtosis,
                quartiles: Quartiles {
                    q1: quantile(0.25),
                    q2: quantile(0.5),
                    q3: quantile(0.75),
                },
                normality_p_value: p_value,
                is_normal: p_value.map(|p| p > config.significance_level),
            },
        );
    }

    Ok(out)
}

/// Biased sample skewness `m3 / m2^1.5` and excess kurtosis `m4 / m2^2 - 3`.
///
/// Both are 0 for constant data.
struct Shape {
    skewness: f64,
    excess_kurtosis: f64,
}

impl Shape {
    fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let m = stats::mean(values).unwrap_or(0.0);
        let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), v| {
            let d = v - m;
            (m2 + d * d, m3 + d.powi(3), m4 + d.powi(4))
        });
        let (m2, m3, m4) = (m2 / n, m3 / n, m4 / n);
        if m2 <= f64::EPSILON {
            return Self {
                skewness: 0.0,
                excess_kurtosis: 0.0,
            };
        }
        Self {
            skewness: m3 / m2.powf(1.5),
            excess_kurtosis: m4 / (m2 * m2) - 3.0,
        }
    }
}

/// D'Agostino's skewness test statistic.
fn skew_z(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let b2 = Shape::of(values).skewness;
    let y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln()
}

/// Anscombe-Glynn kurtosis test statistic.
fn kurtosis_z(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let b2 = Shape::of(values).excess_kurtosis + 3.0;
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 =
        24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / sqrt_beta1.powi(2)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// Omnibus K² test: `K² = Zs² + Zk²` against chi-squared with 2 degrees of freedom.
pub(crate) fn normality_p_value(values: &[f64]) -> Result<f64> {
    let k2 = skew_z(values).powi(2) + kurtosis_z(values).powi(2);
    if !k2.is_finite() {
        return Err(DatanexError::Computation {
            operation: "normality test".to_string(),
            detail: format!("statistic is not finite for {} values", values.len()),
        });
    }
    let chi2 = ChiSquared::new(2.0).map_err(|e| DatanexError::Computation {
        operation: "normality test".to_string(),
        detail: e.to_string(),
    })?;
    Ok(1.0 - chi2.cdf(k2))
}

//! Numeric helpers shared by the engines.
//!
//! Moments, covariance and the median come from `statrs`. The linear
//! quantile estimator and the first-seen mode are kept here because the
//! engines need those exact conventions. Callers drop nulls before handing
//! values in.

use std::hash::Hash;

use indexmap::IndexMap;
use statrs::statistics::{Data, Median, Statistics};

/// Standard deviations at or below this are treated as zero.
const DEGENERATE_STD: f64 = 1.5e-8;

// =============================================================================
// MOMENTS
// =============================================================================

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.mean())
}

/// Sample standard deviation (n - 1), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    (values.len() >= 2).then(|| values.std_dev())
}

/// Population standard deviation (n), `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.population_std_dev())
}

// =============================================================================
// ORDER STATISTICS
// =============================================================================

/// Copy and sort values ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile of already-sorted values with linear interpolation between ranks.
///
/// `statrs` only ships the median-unbiased estimator, which places quartiles
/// differently.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

pub fn median(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| Data::new(values.to_vec()).median())
}

/// Most frequent item; ties go to the one seen first.
pub fn mode<T, I>(items: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut counts: IndexMap<T, usize> = IndexMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    let mut best: Option<(&T, usize)> = None;
    for (item, &count) in &counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item.clone())
}

// =============================================================================
// CORRELATION
// =============================================================================

/// Pearson correlation; `None` when either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (sx, sy) = (x.std_dev(), y.std_dev());
    if sx <= DEGENERATE_STD || sy <= DEGENERATE_STD {
        return None;
    }
    Some((x.covariance(y) / (sx * sy)).clamp(-1.0, 1.0))
}

/// Least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

/// Ordinary least squares of `y` against `x`; `None` for degenerate input.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let r = pearson(x, y)?;
    let slope = x.covariance(y) / x.variance();
    Some(LinearFit {
        slope,
        intercept: y.mean() - slope * x.mean(),
        r,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_std_conventions() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(population_std(&v).unwrap(), 2.0));
        assert!(close(sample_std(&v).unwrap(), (32.0f64 / 7.0).sqrt()));
        assert!(sample_std(&[1.0]).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let s = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert!(close(quantile_sorted(&s, 0.25).unwrap(), 1.75));
        assert!(close(quantile_sorted(&s, 0.75).unwrap(), 3.25));
        assert!(close(median(&[5.0, 1.0, 3.0]).unwrap(), 3.0));
        assert!(close(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5));
    }

    #[test]
    fn test_mode_prefers_first_on_tie() {
        assert_eq!(mode(vec!["b", "a", "a", "b"]), Some("b"));
        assert_eq!(mode(vec!["x", "y", "y"]), Some("y"));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
        assert!(close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0));
        assert!(pearson(&x, &[1.0, 1.0, 1.0, 1.0]).is_none());
    }

    #[test]
    fn test_linear_regression() {
        let fit = linear_regression(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 1.0));
    }
}

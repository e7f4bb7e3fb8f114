//! Principal-component projection of complete numeric rows.

use nalgebra::DMatrix;

use crate::config::PatternConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::stats;

use super::report::{ClusterResult, Projection};

/// Center each column, then scale by its population std unless that is zero.
fn standardize(matrix: &mut DMatrix<f64>) {
    for mut column in matrix.column_iter_mut() {
        let values: Vec<f64> = column.iter().copied().collect();
        let mean = stats::mean(&values).unwrap_or(0.0);
        let std = stats::population_std(&values).unwrap_or(0.0);
        let scale = if std > f64::EPSILON { std } else { 1.0 };
        column.apply(|x| *x = (*x - mean) / scale);
    }
}

/// Sample covariance (n - 1) of already-centered columns.
fn covariance(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let denom = matrix.nrows().saturating_sub(1).max(1) as f64;
    matrix.transpose() * matrix / denom
}

/// Eigenpairs of a symmetric matrix, largest eigenvalue first.
fn eigen_descending(matrix: DMatrix<f64>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let eigen = matrix.symmetric_eigen();
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));
    let values = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let vectors = order
        .iter()
        .map(|&i| eigen.eigenvectors.column(i).iter().copied().collect())
        .collect();
    (values, vectors)
}

pub(crate) fn clusters(dataset: &Dataset, config: &PatternConfig) -> Result<ClusterResult> {
    let numeric = dataset.numeric_columns();
    let complete: Vec<Vec<f64>> = dataset
        .rows()
        .iter()
        .filter_map(|row| numeric.iter().map(|&c| row[c].as_f64()).collect())
        .collect();

    if complete.len() < config.cluster_min_rows || numeric.len() < 2 {
        return Ok(ClusterResult::InsufficientData {
            note: format!(
                "Insufficient data for clustering: {} complete rows, {} numeric columns",
                complete.len(),
                numeric.len()
            ),
            usable_rows: complete.len(),
            numeric_columns: numeric.len(),
        });
    }

    let p = numeric.len();
    let mut matrix = DMatrix::from_fn(complete.len(), p, |i, j| complete[i][j]);
    standardize(&mut matrix);
    let (eigenvalues, mut eigenvectors) = eigen_descending(covariance(&matrix));

    // deterministic orientation: largest loading positive
    for vector in eigenvectors.iter_mut() {
        let pivot = vector
            .iter()
            .copied()
            .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
        if pivot < 0.0 {
            vector.iter_mut().for_each(|x| *x = -*x);
        }
    }

    let k = config.cluster_components.min(p);
    let total: f64 = eigenvalues.iter().map(|v| v.max(0.0)).sum();
    let explained_variance: Vec<f64> = eigenvalues
        .iter()
        .take(k)
        .map(|v| if total > 0.0 { v.max(0.0) / total } else { 0.0 })
        .collect();

    let principal_components = matrix
        .row_iter()
        .take(config.cluster_point_limit)
        .map(|row| {
            eigenvectors
                .iter()
                .take(k)
                .map(|vector| row.iter().zip(vector).map(|(a, b)| a * b).sum())
                .collect()
        })
        .collect();

    Ok(ClusterResult::Projected(Projection {
        n_components: config.cluster_components,
        components_used: k,
        columns: numeric
            .iter()
            .map(|&c| dataset.columns()[c].name.clone())
            .collect(),
        rows_used: complete.len(),
        total_variance_explained: explained_variance.iter().sum(),
        explained_variance,
        principal_components,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnType, Value};

    fn numeric(rows: Vec<[Option<f64>; 3]>) -> Dataset {
        Dataset::new(
            vec![
                Column::new("a", ColumnType::Float),
                Column::new("b", ColumnType::Float),
                Column::new("c", ColumnType::Float),
            ],
            rows.into_iter()
                .map(|r| r.into_iter().map(|v| v.map_or(Value::Null, Value::Float)).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_eigen_descending() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let (values, vectors) = eigen_descending(m);
        assert!((values[0] - 3.0).abs() < 1e-9);
        assert!((values[1] - 1.0).abs() < 1e-9);
        let v0 = &vectors[0];
        assert!((v0[0].abs() - v0[1].abs()).abs() < 1e-9);
        assert!((v0[0] * v0[0] + v0[1] * v0[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_shape_and_variance() {
        let rows = (0..20)
            .map(|i| {
                let x = i as f64;
                [Some(x), Some(2.0 * x + (i % 3) as f64), Some((i % 5) as f64)]
            })
            .collect();
        let result = clusters(&numeric(rows), &PatternConfig::default()).unwrap();
        let ClusterResult::Projected(p) = result else {
            panic!("expected a projection");
        };
        assert_eq!(p.components_used, 2);
        assert_eq!(p.rows_used, 20);
        assert_eq!(p.principal_components.len(), 20);
        assert!(p.principal_components.iter().all(|pt| pt.len() == 2));
        assert!(p.explained_variance[0] >= p.explained_variance[1]);
        assert!(p.total_variance_explained > 0.0 && p.total_variance_explained <= 1.0 + 1e-9);
    }

    #[test]
    fn test_incomplete_rows_excluded() {
        let mut rows: Vec<[Option<f64>; 3]> = (0..9)
            .map(|i| [Some(i as f64), Some(i as f64 * 3.0), Some(1.0)])
            .collect();
        rows.push([Some(1.0), None, Some(2.0)]);
        rows.push([None, Some(1.0), Some(2.0)]);
        match clusters(&numeric(rows), &PatternConfig::default()).unwrap() {
            ClusterResult::InsufficientData { usable_rows, .. } => assert_eq!(usable_rows, 9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_points_capped() {
        let mut config = PatternConfig::default();
        config.cluster_point_limit = 5;
        config.cluster_components = 7;
        let rows = (0..30)
            .map(|i| [Some(i as f64), Some((i * i) as f64), Some((i % 4) as f64)])
            .collect();
        let ClusterResult::Projected(p) = clusters(&numeric(rows), &config).unwrap() else {
            panic!("expected a projection");
        };
        assert_eq!(p.principal_components.len(), 5);
        assert_eq!(p.components_used, 3);
        assert!((p.total_variance_explained - 1.0).abs() < 1e-9);
    }
}

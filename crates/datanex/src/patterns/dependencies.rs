//! Functional dependency search between column pairs.

use std::collections::HashMap;

use tracing::warn;

use crate::config::PatternConfig;
use crate::dataset::{Dataset, Value};
use crate::error::Result;

use super::report::FunctionalDependency;

/// Whether every non-null value of `a` maps to exactly one non-null value of `b`.
fn determines(dataset: &Dataset, a: usize, b: usize) -> bool {
    let mut seen: HashMap<&Value, Option<&Value>> = HashMap::new();
    let mut consistent = true;

    for row in dataset.rows() {
        let key = &row[a];
        if key.is_null() {
            continue;
        }
        let target = &row[b];
        let slot = seen.entry(key).or_insert(None);
        if target.is_null() {
            continue;
        }
        match slot {
            Some(existing) if *existing != target => {
                consistent = false;
                break;
            }
            Some(_) => {}
            None => *slot = Some(target),
        }
    }

    consistent && !seen.is_empty() && seen.values().all(Option::is_some)
}

pub(crate) fn dependencies(
    dataset: &Dataset,
    config: &PatternConfig,
) -> Result<Vec<FunctionalDependency>> {
    let columns = dataset.column_count().min(config.dependency_column_cap);
    if dataset.column_count() > columns {
        warn!(
            columns = dataset.column_count(),
            cap = config.dependency_column_cap,
            "Dependency search limited to the leading columns"
        );
    }

    let mut found = Vec::new();
    for a in 0..columns {
        for b in 0..columns {
            if a != b && determines(dataset, a, b) {
                found.push(FunctionalDependency {
                    determinant: dataset.columns()[a].name.clone(),
                    dependent: dataset.columns()[b].name.clone(),
                    confidence: 1.0,
                });
            }
        }
    }
    Ok(found)
}

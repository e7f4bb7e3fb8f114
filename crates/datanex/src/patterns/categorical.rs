//! Repeated sequences and co-occurring values in text columns.

use indexmap::IndexMap;

use crate::config::PatternConfig;
use crate::dataset::{Dataset, Value};
use crate::error::Result;

use super::report::{Association, Sequence};

pub(crate) fn sequences(dataset: &Dataset, config: &PatternConfig) -> Result<Vec<Sequence>> {
    let window = config.sequence_window;
    let mut found = Vec::new();

    for col in dataset.text_columns() {
        let values: Vec<&Value> = dataset.column_values(col).filter(|v| !v.is_null()).collect();
        if values.len() < window {
            continue;
        }

        let mut counts: IndexMap<&[&Value], usize> = IndexMap::new();
        for run in values.windows(window) {
            *counts.entry(run).or_default() += 1;
        }

        let mut repeated: Vec<(&[&Value], usize)> =
            counts.into_iter().filter(|(_, count)| *count > 1).collect();
        // stable: equal counts keep first-occurrence order
        repeated.sort_by(|a, b| b.1.cmp(&a.1));

        let name = &dataset.columns()[col].name;
        found.extend(
            repeated
                .into_iter()
                .take(config.sequences_per_column)
                .map(|(run, count)| Sequence {
                    column: name.clone(),
                    sequence: run.iter().map(|v| (*v).clone()).collect(),
                    count,
                }),
        );
    }

    Ok(found)
}

/// Value pairs across text columns whose joint frequency reaches the minimum support.
pub(crate) fn associations(dataset: &Dataset, config: &PatternConfig) -> Result<Vec<Association>> {
    let text_cols: Vec<usize> = dataset
        .text_columns()
        .into_iter()
        .take(config.association_max_columns)
        .collect();

    let mut found = Vec::new();
    for (pos, &a) in text_cols.iter().enumerate() {
        for &b in &text_cols[pos + 1..] {
            let mut pairs: IndexMap<(&Value, &Value), usize> = IndexMap::new();
            let mut total = 0usize;
            for row in dataset.rows() {
                let (va, vb) = (&row[a], &row[b]);
                if va.is_null() || vb.is_null() {
                    continue;
                }
                total += 1;
                *pairs.entry((va, vb)).or_default() += 1;
            }
            if total == 0 {
                continue;
            }

            let (name_a, name_b) = (&dataset.columns()[a].name, &dataset.columns()[b].name);
            for ((va, vb), count) in pairs {
                let support = count as f64 / total as f64;
                if support >= config.association_min_support {
                    found.push(Association {
                        item1: format!("{}={}", name_a, va),
                        item2: format!("{}={}", name_b, vb),
                        support,
                        kind: "co_occurrence".to_string(),
                    });
                }
            }
        }
    }

    found.sort_by(|x, y| y.support.total_cmp(&x.support));
    found.truncate(config.association_limit);
    Ok(found)
}

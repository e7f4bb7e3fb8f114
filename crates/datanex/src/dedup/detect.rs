//! Grouping strategies. Each works on a subset of row positions so hybrid
//! search can run them one after another on what is left.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::dataset::{Dataset, Value};

use super::embedding::{EmbeddingModel, cosine_similarity};
use super::report::{DedupMethod, DuplicateGroup, GroupEvidence};

fn group(
    dataset: &Dataset,
    method: DedupMethod,
    indices: Vec<usize>,
    evidence: Option<GroupEvidence>,
) -> DuplicateGroup {
    DuplicateGroup {
        method,
        representative: dataset.row_map(indices[0]),
        indices,
        evidence,
    }
}

/// Rows identical in every column. Nulls compare equal.
pub(crate) fn exact_groups(dataset: &Dataset, candidates: &[usize]) -> Vec<DuplicateGroup> {
    let mut buckets: IndexMap<&[Value], Vec<usize>> = IndexMap::new();
    for &pos in candidates {
        buckets
            .entry(dataset.rows()[pos].as_slice())
            .or_default()
            .push(pos);
    }

    buckets
        .into_values()
        .filter(|members| members.len() > 1)
        .map(|members| group(dataset, DedupMethod::Exact, members, None))
        .collect()
}

/// Normalized form of a row: nulls as `NULL`, text trimmed and lower-cased.
fn normalize_row(row: &[Value]) -> String {
    row.iter()
        .map(|value| match value {
            Value::Null => "NULL".to_string(),
            Value::Text(s) => s.trim().to_lowercase(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Hex SHA-256 digest of the normalized row.
pub(crate) fn fuzzy_digest(row: &[Value]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_row(row).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Rows sharing a normalized digest.
pub(crate) fn fuzzy_groups(
    dataset: &Dataset,
    candidates: &[usize],
    variant_limit: usize,
) -> Vec<DuplicateGroup> {
    let mut buckets: IndexMap<String, Vec<usize>> = IndexMap::new();
    for &pos in candidates {
        buckets
            .entry(fuzzy_digest(&dataset.rows()[pos]))
            .or_default()
            .push(pos);
    }

    buckets
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(digest, members)| {
            let variants = members
                .iter()
                .take(variant_limit)
                .map(|&pos| dataset.row_map(pos))
                .collect();
            group(
                dataset,
                DedupMethod::Fuzzy,
                members,
                Some(GroupEvidence::Hash { digest, variants }),
            )
        })
        .collect()
}

/// Outcome of a semantic pass.
pub(crate) struct SemanticOutcome {
    pub groups: Vec<DuplicateGroup>,
    pub note: Option<String>,
}

impl SemanticOutcome {
    fn degraded(note: impl Into<String>) -> Self {
        Self {
            groups: Vec::new(),
            note: Some(note.into()),
        }
    }
}

/// Greedy grouping on embedding similarity of the concatenated text columns.
///
/// A row joins a group only when it meets `threshold` against every current
/// member, so no two rows in a group are less similar than the threshold.
pub(crate) fn semantic_groups(
    dataset: &Dataset,
    candidates: &[usize],
    threshold: f64,
    row_cap: usize,
    model: &dyn EmbeddingModel,
) -> SemanticOutcome {
    let text_cols = dataset.text_columns();
    if text_cols.is_empty() {
        return SemanticOutcome::degraded("No text columns available for semantic comparison");
    }

    let rows: Vec<usize> = candidates.iter().copied().take(row_cap).collect();
    let mut note = None;
    if candidates.len() > row_cap {
        warn!(
            rows = candidates.len(),
            cap = row_cap,
            "Semantic comparison limited to the first rows"
        );
        note = Some(format!(
            "Semantic comparison limited to the first {} of {} rows",
            row_cap,
            candidates.len()
        ));
    }

    let texts: Vec<String> = rows
        .iter()
        .map(|&pos| {
            text_cols
                .iter()
                .map(|&c| dataset.rows()[pos][c].as_text().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    let vectors = match model.encode(&texts) {
        Ok(v) if v.len() == texts.len() => v,
        Ok(v) => {
            warn!(expected = texts.len(), got = v.len(), "Embedding count mismatch");
            return SemanticOutcome::degraded(format!(
                "Embedding model '{}' returned {} vectors for {} rows",
                model.name(),
                v.len(),
                texts.len()
            ));
        }
        Err(e) => {
            warn!(model = model.name(), error = %e, "Embedding failed");
            return SemanticOutcome::degraded(format!("Embedding model unavailable: {}", e));
        }
    };

    let n = rows.len();
    let mut similarity = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        similarity[i][i] = 1.0;
        for j in (i + 1)..n {
            let s = cosine_similarity(&vectors[i], &vectors[j]);
            similarity[i][j] = s;
            similarity[j][i] = s;
        }
    }

    let mut processed = vec![false; n];
    let mut groups = Vec::new();
    for seed in 0..n {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;

        let mut members = vec![seed];
        for candidate in (seed + 1)..n {
            if processed[candidate] {
                continue;
            }
            if members
                .iter()
                .all(|&m| similarity[m][candidate] >= threshold)
            {
                members.push(candidate);
            }
        }

        if members.len() < 2 {
            continue;
        }
        for &m in &members {
            processed[m] = true;
        }

        let scores = members.iter().map(|&m| similarity[seed][m]).collect();
        let indices: Vec<usize> = members.iter().map(|&m| rows[m]).collect();
        groups.push(group(
            dataset,
            DedupMethod::Semantic,
            indices,
            Some(GroupEvidence::Similarity {
                seed: rows[seed],
                scores,
            }),
        ));
    }

    debug!(rows = n, groups = groups.len(), threshold, "Semantic pass done");
    SemanticOutcome { groups, note }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnType};
    use crate::error::{DatanexError, Result};

    /// Maps each text to a fixed vector for predictable similarities.
    struct TableModel(Vec<(&'static str, Vec<f32>)>);

    impl EmbeddingModel for TableModel {
        fn name(&self) -> &str {
            "table"
        }
        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    self.0
                        .iter()
                        .find(|(k, _)| *k == t.as_str())
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| vec![0.0, 0.0, 1.0])
                })
                .collect())
        }
    }

    struct BrokenModel;

    impl EmbeddingModel for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }
        fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(DatanexError::Embedding("offline".to_string()))
        }
    }

    fn names(values: &[Option<&str>]) -> Dataset {
        Dataset::new(
            vec![Column::new("name", ColumnType::Text)],
            values.iter().map(|v| vec![Value::from(*v)]).collect(),
        )
        .unwrap()
    }

    fn all(ds: &Dataset) -> Vec<usize> {
        (0..ds.row_count()).collect()
    }

    #[test]
    fn test_exact_nulls_equal_and_ordered() {
        let ds = names(&[Some("b"), None, Some("a"), None, Some("b")]);
        let groups = exact_groups(&ds, &all(&ds));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].indices, vec![0, 4]);
        assert_eq!(groups[1].indices, vec![1, 3]);
    }

    #[test]
    fn test_fuzzy_ignores_case_and_whitespace() {
        let ds = names(&[Some(" Alice"), Some("alice "), Some("ALICE"), Some("Bob")]);
        let groups = fuzzy_groups(&ds, &all(&ds), 5);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].indices, vec![0, 1, 2]);
        match &groups[0].evidence {
            Some(GroupEvidence::Hash { digest, variants }) => {
                assert_eq!(digest.len(), 64);
                assert_eq!(variants.len(), 3);
            }
            other => panic!("unexpected evidence {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_null_differs_from_empty_text() {
        assert_ne!(
            fuzzy_digest(&[Value::Null]),
            fuzzy_digest(&[Value::from("")])
        );
    }

    #[test]
    fn test_semantic_complete_linkage() {
        // a~b and b~c are above threshold, a~c is not
        let s = 0.8f32;
        let model = TableModel(vec![
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![s, (1.0 - s * s).sqrt(), 0.0]),
            ("c", vec![0.3, (1.0f32 - 0.09).sqrt(), 0.0]),
        ]);
        let ds = names(&[Some("a"), Some("b"), Some("c")]);
        let outcome = semantic_groups(&ds, &all(&ds), 0.75, 1000, &model);
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].indices, vec![0, 1]);
    }

    #[test]
    fn test_semantic_without_text_columns() {
        let ds = Dataset::new(
            vec![Column::new("n", ColumnType::Integer)],
            vec![vec![Value::Integer(1)], vec![Value::Integer(1)]],
        )
        .unwrap();
        let outcome = semantic_groups(&ds, &all(&ds), 0.9, 1000, &BrokenModel);
        assert!(outcome.groups.is_empty());
        assert!(outcome.note.unwrap().contains("No text columns"));
    }

    #[test]
    fn test_semantic_model_failure_degrades() {
        let ds = names(&[Some("a"), Some("a")]);
        let outcome = semantic_groups(&ds, &all(&ds), 0.9, 1000, &BrokenModel);
        assert!(outcome.groups.is_empty());
        assert!(outcome.note.unwrap().contains("offline"));
    }

    #[test]
    fn test_semantic_row_cap() {
        let model = TableModel(vec![]);
        let ds = names(&[Some("x"), Some("y"), Some("z")]);
        let outcome = semantic_groups(&ds, &all(&ds), 0.9, 2, &model);
        assert_eq!(outcome.groups[0].indices, vec![0, 1]);
        assert!(outcome.note.is_some());
    }
}

//! Property-based tests for the Datanex engines.
//!
//! These tests use proptest to generate random datasets and check that the
//! engines keep their invariants on all of them.
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p datanex --test property_tests
//! ```

use std::collections::HashSet;

use proptest::prelude::*;

use datanex::dedup::{GroupEvidence, HashingEmbedder, cosine_similarity};
use datanex::{
    CleanStrategy, Column, ColumnType, Dataset, DedupMethod, Deduplicator, EmbeddingModel,
    KeepPolicy, PatternFinder, SharedEmbedder, Validator, Value,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// Short lowercase words, optionally missing.
fn cell() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        4 => "[a-c]{1,2}".prop_map(Some),
        1 => Just(None),
    ]
}

/// Integers in a small range so duplicates are common.
fn number() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![
        4 => (-3i64..4).prop_map(Some),
        1 => Just(None),
    ]
}

/// A `name, email, age` dataset with frequent duplicates and nulls.
fn dataset() -> impl Strategy<Value = Dataset> {
    prop::collection::vec((cell(), cell(), number()), 0..40).prop_map(|rows| {
        Dataset::new(
            vec![
                Column::new("name", ColumnType::Text),
                Column::new("email", ColumnType::Text),
                Column::new("age", ColumnType::Integer),
            ],
            rows.into_iter()
                .map(|(name, email, age)| {
                    vec![
                        name.map_or(Value::Null, Value::Text),
                        email.map_or(Value::Null, Value::Text),
                        age.map_or(Value::Null, Value::Integer),
                    ]
                })
                .collect(),
        )
        .expect("generated rows fit the schema")
    })
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    #[test]
    fn quality_score_in_unit_interval(ds in dataset()) {
        let report = Validator::new().validate(&ds, &[]);
        prop_assert!((0.0..=1.0).contains(&report.quality_score));
        prop_assert!(report.invalid_rows.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(report.invalid_rows.iter().all(|&r| r < ds.row_count()));
    }

    #[test]
    fn drop_removes_invalid_rows(ds in dataset()) {
        let validator = Validator::new();
        let report = validator.validate(&ds, &[]);
        let cleaned = validator.clean(&ds, &report, CleanStrategy::Drop).unwrap();
        prop_assert_eq!(cleaned.row_count(), ds.row_count() - report.invalid_rows.len());
    }

    #[test]
    fn fill_leaves_no_nulls_in_reported_columns(ds in dataset()) {
        let validator = Validator::new();
        let report = validator.validate(&ds, &[]);
        let filled = validator.clean(&ds, &report, CleanStrategy::Fill).unwrap();
        prop_assert_eq!(filled.row_count(), ds.row_count());
        for name in report.nulls.keys() {
            let idx = filled.column_index(name).unwrap();
            let has_value = ds.column_values(idx).any(|v| !v.is_null());
            if has_value {
                prop_assert!(filled.column_values(idx).all(|v| !v.is_null()));
            }
        }
    }
}

// =============================================================================
// Deduplication
// =============================================================================

proptest! {
    #[test]
    fn exact_groups_partition_duplicated_rows(ds in dataset()) {
        let report = Deduplicator::new().find_duplicates(&ds, DedupMethod::Exact);

        let mut seen = HashSet::new();
        for group in &report.groups {
            prop_assert!(group.len() >= 2);
            let first = ds.row(group.indices[0]).unwrap();
            for &i in &group.indices {
                prop_assert!(seen.insert(i));
                prop_assert_eq!(ds.row(i).unwrap(), first);
            }
        }
        // every row with an identical sibling is grouped
        for i in 0..ds.row_count() {
            let has_twin = (0..ds.row_count()).any(|j| j != i && ds.row(j) == ds.row(i));
            prop_assert_eq!(has_twin, seen.contains(&i));
        }
        prop_assert_eq!(
            report.unique_count,
            ds.row_count() - report.duplicates_found + report.groups.len()
        );
    }

    #[test]
    fn removal_is_idempotent(ds in dataset()) {
        let dedup = Deduplicator::new();
        let report = dedup.find_duplicates(&ds, DedupMethod::Exact);
        let deduped = dedup.remove_duplicates(&ds, &report, KeepPolicy::First).unwrap();
        prop_assert_eq!(deduped.row_count(), report.unique_count);
        let again = dedup.find_duplicates(&deduped, DedupMethod::Exact);
        prop_assert!(again.groups.is_empty());
    }

    #[test]
    fn fuzzy_ignores_case_and_padding(words in prop::collection::vec("[a-z]{1,6}", 1..10)) {
        let rows: Vec<Vec<Value>> = words
            .iter()
            .flat_map(|w| {
                [
                    vec![Value::Text(w.clone())],
                    vec![Value::Text(format!("  {} ", w.to_uppercase()))],
                ]
            })
            .collect();
        let ds = Dataset::new(vec![Column::new("w", ColumnType::Text)], rows).unwrap();
        let report = Deduplicator::new().find_duplicates(&ds, DedupMethod::Fuzzy);
        let distinct: HashSet<&String> = words.iter().collect();
        prop_assert_eq!(report.groups.len(), distinct.len());
        prop_assert_eq!(report.unique_count, distinct.len());
    }

    #[test]
    fn semantic_groups_never_below_threshold(
        texts in prop::collection::vec("[a-d ]{3,12}", 2..15),
        threshold in 0.3f64..0.99,
    ) {
        let embedder = HashingEmbedder::default();
        let vectors = embedder.encode(&texts).unwrap();
        let ds = Dataset::new(
            vec![Column::new("t", ColumnType::Text)],
            texts.iter().map(|t| vec![Value::Text(t.clone())]).collect(),
        )
        .unwrap();

        let dedup = Deduplicator::new()
            .with_embedder(SharedEmbedder::from_model(HashingEmbedder::default()));
        let report = dedup
            .find_duplicates_with_threshold(&ds, DedupMethod::Semantic, threshold)
            .unwrap();

        for group in &report.groups {
            let has_similarity_evidence =
                matches!(group.evidence, Some(GroupEvidence::Similarity { .. }));
            prop_assert!(has_similarity_evidence);
            for (a, &i) in group.indices.iter().enumerate() {
                for &j in &group.indices[a + 1..] {
                    prop_assert!(cosine_similarity(&vectors[i], &vectors[j]) >= threshold);
                }
            }
        }
    }
}

// =============================================================================
// Patterns
// =============================================================================

proptest! {
    #[test]
    fn far_value_is_anomalous(
        base in prop::collection::vec(-100.0f64..100.0, 4..30),
    ) {
        let n = base.len() as f64;
        let mean = base.iter().sum::<f64>() / n;
        let std = (base.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        prop_assume!(std > 1e-6);

        let outlier = mean + 10.0 * std;
        let mut values = base.clone();
        values.push(outlier);
        let ds = Dataset::new(
            vec![Column::new("v", ColumnType::Float)],
            values.iter().map(|v| vec![Value::Float(*v)]).collect(),
        )
        .unwrap();

        let report = PatternFinder::new().find_patterns(&ds);
        let anomaly = report.anomalies.iter().find(|a| a.column == "v");
        prop_assert!(anomaly.is_some_and(|a| a.indices.contains(&base.len())));
    }

    #[test]
    fn pattern_discovery_never_degrades_on_numeric_data(
        rows in prop::collection::vec((-50i64..50, -50.0f64..50.0), 0..40),
    ) {
        let ds = Dataset::new(
            vec![
                Column::new("a", ColumnType::Integer),
                Column::new("b", ColumnType::Float),
            ],
            rows.iter()
                .map(|(a, b)| vec![Value::Integer(*a), Value::Float(*b)])
                .collect(),
        )
        .unwrap();
        let report = PatternFinder::new().find_patterns(&ds);
        prop_assert!(report.degraded.is_empty());
        for c in &report.correlations {
            prop_assert!(c.correlation.abs() >= 0.7 && c.correlation.abs() <= 1.0);
        }
    }
}

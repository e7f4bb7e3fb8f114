//! Engine performance benchmarks.
//!
//! Measures validation, duplicate detection and pattern discovery on
//! generated customer-like datasets.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use datanex::{
    Column, ColumnType, Dataset, DedupMethod, Deduplicator, PatternFinder, Validator, Value,
};

const CITIES: &[&str] = &["Paris", "Lyon", "Rome", "Berlin", "Madrid", "Oslo"];
const FIRST_NAMES: &[&str] = &["Ann", "Bob", "Cara", "Dev", "Eli", "Fay", "Gus", "Hana"];

/// Generate a dataset with nulls, outliers, bad emails and ~10% duplicates.
fn generate_dataset(rows: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let mut data: Vec<Vec<Value>> = Vec::with_capacity(rows);

    for row in 0..rows {
        if row > 0 && rng.gen_bool(0.1) {
            let source = rng.gen_range(0..row);
            data.push(data[source].clone());
            continue;
        }

        let name = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
        let email = if rng.gen_bool(0.05) {
            Value::from("not-an-email")
        } else {
            Value::Text(format!("{}{}@example.com", name.to_lowercase(), row))
        };
        let age = if rng.gen_bool(0.03) {
            Value::Null
        } else {
            Value::Integer(rng.gen_range(18..90))
        };
        let income = if rng.gen_bool(0.01) {
            Value::Float(1.0e7)
        } else {
            Value::Float(rng.gen_range(20_000.0..120_000.0))
        };
        let spend = match &income {
            Value::Float(v) => Value::Float(v * 0.3 + rng.gen_range(-500.0..500.0)),
            _ => Value::Null,
        };

        data.push(vec![
            Value::from(name),
            email,
            age,
            income,
            spend,
            Value::from(CITIES[rng.gen_range(0..CITIES.len())]),
        ]);
    }

    Dataset::new(
        vec![
            Column::new("name", ColumnType::Text),
            Column::new("email", ColumnType::Text),
            Column::new("age", ColumnType::Integer),
            Column::new("income", ColumnType::Float),
            Column::new("spend", ColumnType::Float),
            Column::new("city", ColumnType::Text),
        ],
        data,
    )
    .unwrap()
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let validator = Validator::new();

    for rows in [100, 1_000, 10_000].iter() {
        let dataset = generate_dataset(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("validate", rows), &dataset, |b, ds| {
            b.iter(|| black_box(validator.validate(ds, &[])))
        });
    }

    group.finish();
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");
    let dedup = Deduplicator::new();

    for rows in [100, 1_000, 10_000].iter() {
        let dataset = generate_dataset(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        for method in [DedupMethod::Exact, DedupMethod::Fuzzy, DedupMethod::Hybrid] {
            group.bench_with_input(
                BenchmarkId::new(method.as_str(), rows),
                &dataset,
                |b, ds| b.iter(|| black_box(dedup.find_duplicates(ds, method))),
            );
        }
    }

    // semantic is quadratic and capped, so keep it small
    for rows in [50, 200].iter() {
        let dataset = generate_dataset(*rows);
        group.bench_with_input(BenchmarkId::new("semantic", rows), &dataset, |b, ds| {
            b.iter(|| black_box(dedup.find_duplicates(ds, DedupMethod::Semantic)))
        });
    }

    group.finish();
}

fn bench_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("patterns");
    let finder = PatternFinder::new();

    for rows in [100, 1_000, 5_000].iter() {
        let dataset = generate_dataset(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("find_patterns", rows), &dataset, |b, ds| {
            b.iter(|| black_box(finder.find_patterns(ds)))
        });
        group.bench_with_input(BenchmarkId::new("dependencies", rows), &dataset, |b, ds| {
            b.iter(|| black_box(finder.find_dependencies(ds)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validation, bench_dedup, bench_patterns);
criterion_main!(benches);

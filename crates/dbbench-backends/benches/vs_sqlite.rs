//! SQLite adapter overhead.
//!
//! Runs single relational operations through the `Backend` trait, the same
//! path the runner takes, so adapter costs outside the timed window show up.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dbbench_backends::suite;
use dbbench_backends::{Scale, SqliteBackend};
use dbbench_core::{Backend, Params};

fn connected(scale: Scale) -> SqliteBackend {
    let mut backend = SqliteBackend::in_memory().with_scale(scale);
    backend.connect().unwrap();
    backend.prepare().unwrap();
    backend
}

fn bench_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("vs_sqlite/lookup");

    for &scale in &[Scale::Small, Scale::Medium] {
        let name = format!("{:?}", scale);
        let mut backend = connected(scale);
        let params = Params::new();

        for operation in [suite::SELECT_BY_ID, suite::SELECT_BY_EMAIL, suite::SELECT_WITH_JOIN] {
            group.bench_with_input(BenchmarkId::new(operation, &name), &(), |b, _| {
                b.iter(|| black_box(backend.perform(operation, &params).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_aggregates(c: &mut Criterion) {
    let mut group = c.benchmark_group("vs_sqlite/aggregate");
    let mut backend = connected(Scale::Medium);
    let params = Params::new();

    for operation in [suite::AGGREGATE_QUERY, suite::COMPLEX_QUERY] {
        group.bench_function(operation, |b| {
            b.iter(|| black_box(backend.perform(operation, &params).unwrap()));
        });
    }

    group.finish();
}

fn bench_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("vs_sqlite/insert");
    let mut backend = connected(Scale::Tiny);

    group.bench_function(suite::INSERT_SINGLE, |b| {
        let params = Params::new();
        b.iter(|| black_box(backend.perform(suite::INSERT_SINGLE, &params).unwrap()));
    });

    for batch in [10u64, 50, 200] {
        let params = Params::new().with(suite::BATCH_SIZE, batch);
        group.bench_with_input(BenchmarkId::new(suite::INSERT_BATCH, batch), &params, |b, params| {
            b.iter(|| black_box(backend.perform(suite::INSERT_BATCH, params).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookups, bench_aggregates, bench_inserts);
criterion_main!(benches);

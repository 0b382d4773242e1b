// Resampling benchmark - measure sparse events → dense series conversion
//
// Isolates the per-zone grid fill from CSV parsing and JSON encoding, then
// measures the CSV load separately since it dominates real runs.

use chrono::TimeDelta;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pickups2deepar_core::{resample, EntitySet, EventTable, ResamplePolicy};

mod fixtures;
use fixtures::{generate_events, to_csv, WorkloadSize};

/// Benchmark both resample policies on pre-loaded tables
fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let step = TimeDelta::minutes(10);

    for size in [WorkloadSize::Small, WorkloadSize::Medium] {
        let table = generate_events(size);
        let entities = EntitySet::enumerate(&table).unwrap();

        group.throughput(Throughput::Elements(table.len() as u64));

        for policy in [ResamplePolicy::ExactMatch, ResamplePolicy::Bucketed] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", policy), format!("{:?}", size)),
                &(&table, &entities),
                |b, (table, entities)| {
                    b.iter(|| {
                        let (series, stats) = resample(table, entities, step, policy).unwrap();
                        black_box((series, stats));
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark parsing the staged CSV into an EventTable
fn bench_load_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_csv");

    let csv = to_csv(&generate_events(WorkloadSize::Medium));
    group.throughput(Throughput::Bytes(csv.len() as u64));

    group.bench_function("Medium", |b| {
        b.iter(|| {
            let table = EventTable::from_reader(csv.as_bytes()).unwrap();
            black_box(table);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resample, bench_load_csv);
criterion_main!(benches);

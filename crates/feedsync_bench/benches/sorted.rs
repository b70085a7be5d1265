//! Sorted collection benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use feedsync_bench::{page, shuffled_activities};
use feedsync_core::{sorted_merge, ActivityData, QueryConfiguration, SortedVec};

/// Benchmark building a list one insert at a time.
fn bench_sorted_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_insert");
    let order = QueryConfiguration::<ActivityData>::default();

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let batch = shuffled_activities(count);
            b.iter(|| {
                let mut items: Vec<ActivityData> = Vec::with_capacity(count);
                for activity in batch.iter().cloned() {
                    items.sorted_insert(activity, order.comparator());
                }
                black_box(items);
            });
        });
    }
    group.finish();
}

/// Benchmark re-inserting an existing item (the duplicate event path).
fn bench_sorted_insert_existing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_insert_existing");
    let order = QueryConfiguration::<ActivityData>::default();

    for count in [1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut items = page(0, count);
            let duplicate = items[count / 2].clone();
            b.iter(|| {
                let replaced = items.sorted_insert(black_box(duplicate.clone()), order.comparator());
                black_box(replaced);
            });
        });
    }
    group.finish();
}

/// Benchmark merging a fetched page into a loaded list.
fn bench_sorted_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_merge");
    let order = QueryConfiguration::<ActivityData>::default();

    for (loaded, incoming) in [(100, 25), (1_000, 25), (1_000, 250), (10_000, 250)].iter() {
        let id = format!("{loaded}+{incoming}");
        group.throughput(Throughput::Elements((*loaded + *incoming) as u64));
        group.bench_with_input(
            BenchmarkId::new("overlapping", &id),
            &(*loaded, *incoming),
            |b, &(loaded, incoming)| {
                let existing = page(0, loaded);
                // The incoming page repeats the last few loaded items.
                let fresh = page(loaded.saturating_sub(5), incoming);
                b.iter(|| {
                    let merged = sorted_merge(
                        black_box(existing.clone()),
                        black_box(fresh.clone()),
                        order.comparator(),
                    );
                    black_box(merged);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sorted_insert,
    bench_sorted_insert_existing,
    bench_sorted_merge,
);
criterion_main!(benches);

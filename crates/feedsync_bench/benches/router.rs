//! Event router benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use feedsync_bench::{bench_feed, page};
use feedsync_client::{EventRouter, FeedState};
use feedsync_core::{ActivityData, QueryConfiguration};
use feedsync_protocol::WsEvent;
use std::sync::Arc;

fn added_events(first: usize, count: usize) -> Vec<WsEvent> {
    page(first, count)
        .into_iter()
        .map(|activity| WsEvent::ActivityAdded {
            fid: bench_feed(),
            created_at: activity.created_at,
            activity: activity.into(),
        })
        .collect()
}

fn feed_state() -> Arc<FeedState> {
    Arc::new(FeedState::new(
        bench_feed(),
        "bench",
        QueryConfiguration::<ActivityData>::default(),
    ))
}

/// Benchmark routing fresh events into one feed.
fn bench_handle_ws(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_ws");

    for count in [100, 1_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let events = added_events(0, count);
            b.iter(|| {
                let router = EventRouter::new(256);
                let state = feed_state();
                router.register(&state);
                for event in events.iter().cloned() {
                    black_box(router.handle_ws(event));
                }
            });
        });
    }
    group.finish();
}

/// Benchmark redelivered events, which the dedupe window drops.
fn bench_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_ws_duplicates");

    for window in [64, 256, 1_024].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(window), window, |b, &window| {
            let router = EventRouter::new(window);
            let state = feed_state();
            router.register(&state);
            let events = added_events(0, window);
            for event in events.iter().cloned() {
                router.handle_ws(event);
            }
            let duplicate = events[window / 2].clone();
            b.iter(|| black_box(router.handle_ws(duplicate.clone())));
        });
    }
    group.finish();
}

/// Benchmark fan-out to many subscribers that all ignore the event.
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for subscribers in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            subscribers,
            |b, &subscribers| {
                let router = EventRouter::new(0);
                let states: Vec<_> = (0..subscribers)
                    .map(|n| {
                        let state = Arc::new(FeedState::new(
                            feedsync_core::FeedId::new("user", format!("other{n}")),
                            "bench",
                            QueryConfiguration::<ActivityData>::default(),
                        ));
                        router.register(&state);
                        state
                    })
                    .collect();
                let event = added_events(0, 1).remove(0);
                b.iter(|| black_box(router.handle_ws(event.clone())));
                drop(states);
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_handle_ws, bench_duplicates, bench_fan_out);
criterion_main!(benches);

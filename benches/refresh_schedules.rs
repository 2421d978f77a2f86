use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures_util::future::join_all;
use tokio::runtime::Runtime;

use feedwatch::config::default_sensors;
use feedwatch::demo::demo_feed_at;
use feedwatch::{FailurePolicy, Schedule, Settings, SensorSuite};

/// Simulated round trip of one feed request.
const LATENCY: Duration = Duration::from_millis(5);

fn suites(settings: &Settings, count: usize, schedule: Schedule) -> Vec<SensorSuite> {
    (0..count)
        .map(|_| {
            settings
                .build_suite()
                .with_schedule(schedule)
                .with_policy(FailurePolicy::Continue)
        })
        .collect()
}

/// One suite of five sensors, refreshed under each schedule
fn bench_single_suite(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let settings = Settings::default();
    let feed = demo_feed_at(&default_sensors(), 24, chrono::Utc::now()).with_latency(LATENCY);

    let mut group = c.benchmark_group("single_suite");
    group.throughput(Throughput::Elements(settings.sensors.len() as u64));

    for schedule in [Schedule::Sequential, Schedule::Concurrent] {
        group.bench_function(BenchmarkId::from_parameter(schedule), |b| {
            b.iter(|| {
                let mut suite = suites(&settings, 1, schedule).remove(0);
                rt.block_on(suite.refresh_all(&feed)).unwrap();
            });
        });
    }
    group.finish();
}

/// Several independent suites sharing one client: one after another with the
/// sequential schedule versus all at once with the concurrent schedule
fn bench_independent_suites(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let settings = Settings::default();
    let feed = demo_feed_at(&default_sensors(), 24, chrono::Utc::now()).with_latency(LATENCY);

    let mut group = c.benchmark_group("independent_suites");
    group.sample_size(20);

    for count in [1usize, 3, 8] {
        group.throughput(Throughput::Elements((count * settings.sensors.len()) as u64));

        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            b.iter(|| {
                let mut all = suites(&settings, count, Schedule::Sequential);
                rt.block_on(async {
                    for suite in &mut all {
                        suite.refresh_all(&feed).await.unwrap();
                    }
                });
            });
        });

        group.bench_with_input(BenchmarkId::new("concurrent", count), &count, |b, &count| {
            b.iter(|| {
                let mut all = suites(&settings, count, Schedule::Concurrent);
                rt.block_on(join_all(all.iter_mut().map(|suite| suite.refresh_all(&feed))));
            });
        });
    }
    group.finish();
}

/// Aggregation cost over a full page of readings
fn bench_window_statistics(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let settings = Settings {
        // 1000 readings at 15 minute spacing
        window_hours: 250,
        ..Settings::default()
    };
    let feed = demo_feed_at(&settings.sensors, settings.window_hours, chrono::Utc::now());
    let mut suite = settings.build_suite();
    rt.block_on(suite.refresh_all(&feed)).unwrap();

    c.bench_function("snapshot_full_page", |b| b.iter(|| suite.snapshot()));
}

criterion_group!(
    benches,
    bench_single_suite,
    bench_independent_suites,
    bench_window_statistics,
);
criterion_main!(benches);

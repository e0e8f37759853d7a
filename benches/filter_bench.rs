//! Benchmarks for the report filter and statistics passes
//!
//! Run with: cargo bench

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use leakwatch::report::*;

const LEAK_TYPES: [&str; 6] = [
    "Burst Pipe",
    "Minor Leak",
    "Broken Valve",
    "Small Drip",
    "Moderate Seepage",
    "Unknown",
];

fn create_test_reports(count: usize) -> Vec<Report> {
    (0..count)
        .map(|i| {
            let day = 1 + (i % 28);
            Report::new(i as i64, format!("{} Main St", i), LEAK_TYPES[i % LEAK_TYPES.len()])
                .created_at(format!("2025-06-{:02}T{:02}:15:00Z", day, i % 24))
                .district(format!("District {}", (b'A' + (i % 5) as u8) as char))
                .resolved(i % 3 == 0)
        })
        .collect()
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    let narrow = FilterState::default()
        .status(StatusFilter::Active)
        .severities([Severity::Critical, Severity::Moderate])
        .district("District B")
        .date_range(DateRange::new(
            NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
        ));

    for size in [100, 1000, 10000] {
        let reports = create_test_reports(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("identity_{}", size), |b| {
            let filters = FilterState::default();
            b.iter(|| apply_filters(black_box(&reports), black_box(&filters)).len())
        });

        group.bench_function(format!("narrow_{}", size), |b| {
            b.iter(|| apply_filters(black_box(&reports), black_box(&narrow)).len())
        });
    }

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    let today = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();

    for size in [100, 1000, 10000] {
        let reports = create_test_reports(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("compute_{}", size), |b| {
            b.iter(|| compute_statistics(black_box(&reports), black_box(today)))
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    c.bench_function("classify", |b| {
        b.iter(|| {
            for label in LEAK_TYPES {
                black_box(classify(black_box(label)));
            }
        })
    });
}

criterion_group!(benches, bench_filters, bench_statistics, bench_classify);
criterion_main!(benches);

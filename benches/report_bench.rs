//! Aggregation benchmarks.
//!
//! Every query endpoint recomputes its result from the full dataset, so these
//! numbers are per-request latency at the given dataset size.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `dashboard` | `dashboard_stats` including top-N truncation |
//! | `pivot` | monthly (zero-filled) and daily (sparse) technician pivots |
//! | `filter` | a selective and a full-scan filter |
//!
//! ```sh
//! cargo bench --bench report_bench
//! ```

use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ticketlens_core::{
    report::{self, Filter},
    Dataset, TicketRecord,
};

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn dataset(n: usize) -> Dataset {
    let statuses = ["Nuevo", "Pendiente", "Resuelto", "Cerrado"];
    Dataset::from_records(
        (0..n)
            .map(|i| TicketRecord {
                id: i as i64 + 1,
                date: NaiveDate::from_ymd_opt(2022 + (i % 3) as i32, (i % 12) as u32 + 1, (i % 28) as u32 + 1)
                    .and_then(|d| d.and_hms_opt(9, 0, 0)),
                status: statuses[i % statuses.len()].to_string(),
                priority: if i % 5 == 0 { "Alta" } else { "Media" }.to_string(),
                technician: format!("Técnico {}", i % 40),
                category: format!("Cat {}", i % 11),
            })
            .collect(),
    )
}

fn dashboard_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard");
    for n in SIZES {
        let ds = dataset(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ds, |b, ds| {
            b.iter(|| black_box(report::dashboard_stats(ds, 10)))
        });
    }
    group.finish();
}

fn pivot_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("pivot");
    for n in SIZES {
        let ds = dataset(n);
        group.bench_with_input(BenchmarkId::new("monthly", n), &ds, |b, ds| {
            b.iter(|| black_box(report::technician_monthly(ds)))
        });
        group.bench_with_input(BenchmarkId::new("daily", n), &ds, |b, ds| {
            b.iter(|| black_box(report::technician_daily(ds)))
        });
    }
    group.finish();
}

fn filter_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let ds = dataset(100_000);
    let pending = Filter::Pending;
    let month = Filter::Month("marzo".to_string());

    group.bench_function("pending", |b| {
        b.iter(|| black_box(report::filter_tickets(&ds, &pending)))
    });
    group.bench_function("month_name", |b| {
        b.iter(|| black_box(report::filter_tickets(&ds, &month)))
    });
    group.finish();
}

criterion_group!(benches, dashboard_bench, pivot_bench, filter_bench);
criterion_main!(benches);

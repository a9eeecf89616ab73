//! Criterion benchmarks for SignalVote hot paths.
//!
//! Benchmarks:
//! 1. Simulator fold over signal series of increasing length
//! 2. Weighted aggregation of four opinions
//! 3. Indicator enrichment
//! 4. Full ensemble decision (model fits included)

use std::collections::BTreeMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signalvote_core::models::LinearTrendPredictor;
use signalvote_core::{
    enrich, Ensemble, ModelId, ModelSettings, PricePoint, Signal, SignalAggregator, Simulator,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_points(n: usize) -> Vec<PricePoint> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            PricePoint {
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

fn make_series(n: usize) -> Vec<(PricePoint, Signal)> {
    make_points(n)
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let signal = match i % 7 {
                0 => Signal::Buy,
                3 => Signal::Sell,
                _ => Signal::Hold,
            };
            (p, signal)
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_simulate(c: &mut Criterion) {
    let sim = Simulator::new(100_000.0).unwrap();
    let mut group = c.benchmark_group("simulate");
    for n in [252, 2520, 25_200] {
        let series = make_series(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &series, |b, s| {
            b.iter(|| sim.simulate(black_box(s)).unwrap())
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let agg = SignalAggregator::default();
    let opinions = BTreeMap::from([
        (ModelId::Sequence, Signal::Buy),
        (ModelId::Autoregressive, Signal::Sell),
        (ModelId::Volatility, Signal::Sell),
        (ModelId::Oscillator, Signal::Buy),
    ]);
    c.bench_function("aggregate_four", |b| {
        b.iter(|| agg.aggregate(black_box(&opinions)))
    });
}

fn bench_enrich(c: &mut Criterion) {
    let points = make_points(2520);
    c.bench_function("enrich_2520", |b| b.iter(|| enrich(black_box(&points))));
}

fn bench_ensemble(c: &mut Criterion) {
    let ensemble = Ensemble::standard(
        Arc::new(LinearTrendPredictor::default()),
        ModelSettings::default(),
    )
    .unwrap();
    let history = enrich(&make_points(300));
    c.bench_function("ensemble_decide_300", |b| {
        b.iter(|| ensemble.decide(black_box(&history)))
    });
}

criterion_group!(benches, bench_simulate, bench_aggregate, bench_enrich, bench_ensemble);
criterion_main!(benches);

use core_sim::{BacktestConfig, PriceGenerator};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use runtime::run_backtest;
use time::macros::datetime;

const BENCH_BARS: usize = 10_000;

fn bench_backtest_throughput(c: &mut Criterion) {
    let bars = PriceGenerator::new(7, 100.0, 0.02)
        .daily_bars(datetime!(1990-01-01 0:00 UTC), BENCH_BARS);
    let config = BacktestConfig::default();

    let mut group = c.benchmark_group("backtest_throughput");
    group.throughput(Throughput::Elements(BENCH_BARS as u64));

    group.bench_function(BenchmarkId::new("run_backtest", BENCH_BARS), |b| {
        b.iter(|| {
            let report = run_backtest(black_box(&bars), &config).expect("backtest should run");
            black_box(report);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_backtest_throughput);
criterion_main!(benches);

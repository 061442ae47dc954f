//! Performance benchmarks for the best-track pipeline.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stormtrack::synthetic::StormScenario;
use stormtrack::{run_tracking, TrackParams};

fn bench_pipeline_scaling(c: &mut Criterion) {
    let params = TrackParams::default().validated().unwrap();
    let mut group = c.benchmark_group("pipeline");

    for &storm_count in &[10, 50, 200] {
        let scenario = StormScenario {
            storm_count,
            scans_per_storm: 12,
            noise_sigma_m: 500.0,
            dropout_rate: 0.1,
            seed: 42,
            ..StormScenario::default()
        };
        let dataset = scenario.generate();

        group.bench_with_input(
            BenchmarkId::new("storms", storm_count),
            &dataset.cells,
            |b, cells| {
                b.iter(|| run_tracking(black_box(cells.clone()), &params));
            },
        );
    }
    group.finish();
}

fn bench_partitioned(c: &mut Criterion) {
    // Force big-data mode over a multi-day scenario.
    let params = TrackParams {
        big_data_threshold: 1,
        ..TrackParams::default()
    }
    .validated()
    .unwrap();

    let mut cells = Vec::new();
    for day in 0..3 {
        let scenario = StormScenario {
            storm_count: 50,
            start_timestamp: 1_700_000_000 + day * 86_400,
            seed: 42 + day as u64,
            ..StormScenario::default()
        };
        cells.extend(scenario.generate().cells);
    }

    c.bench_function("pipeline/daily_partitions", |b| {
        b.iter(|| run_tracking(black_box(cells.clone()), &params));
    });
}

criterion_group!(benches, bench_pipeline_scaling, bench_partitioned);
criterion_main!(benches);

//! Benchmarks for engine ingest followed by the once-per-frame reduction.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fluxscope::{EngineConfig, ScopeEngine};

use crate::BLOCK_SIZES;

/// Plot width of a full-screen terminal in braille dots.
const PIXEL_WIDTH: usize = 400;

pub fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/ingest");

    for &size in BLOCK_SIZES {
        let tone = crate::sine(size);
        let planes: [&[f32]; 2] = [&tone, &tone];

        // Free-run marks the traces stale on every block.
        let mut free_run = ScopeEngine::new(EngineConfig {
            trigger_enabled: false,
            ..EngineConfig::default()
        });
        free_run.set_pixel_width(PIXEL_WIDTH);
        group.bench_with_input(BenchmarkId::new("free_run_10ms", size), &size, |b, _| {
            b.iter(|| {
                let report = free_run.ingest(black_box(&planes), size);
                free_run.refresh_if_dirty();
                report
            })
        });

        // 100 ms across 400 pixels puts the reducer in envelope mode.
        let mut triggered = ScopeEngine::new(EngineConfig {
            display_time: 0.1,
            ..EngineConfig::default()
        });
        triggered.set_pixel_width(PIXEL_WIDTH);
        group.bench_with_input(BenchmarkId::new("triggered_100ms", size), &size, |b, _| {
            b.iter(|| {
                let report = triggered.ingest(black_box(&planes), size);
                triggered.refresh_if_dirty();
                report
            })
        });
    }

    group.finish();
}

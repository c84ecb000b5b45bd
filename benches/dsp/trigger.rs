//! Benchmarks for edge detection.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fluxscope::dsp::trigger::{find_edge, TriggerState};

use crate::BLOCK_SIZES;

pub fn bench_trigger(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/trigger");

    for &size in BLOCK_SIZES {
        // Worst case: no crossing, every sample is inspected.
        let quiet = vec![0.05f32; size];
        group.bench_with_input(BenchmarkId::new("scan_no_edge", size), &size, |b, _| {
            let mut state = TriggerState::new(true, true, 0.5);
            b.iter(|| find_edge(black_box(&quiet), black_box(&mut state)))
        });

        let tone = crate::sine(size);
        group.bench_with_input(BenchmarkId::new("scan_sine", size), &size, |b, _| {
            b.iter(|| {
                let mut state = TriggerState::new(true, false, 0.2);
                find_edge(black_box(&tone), black_box(&mut state))
            })
        });
    }

    group.finish();
}

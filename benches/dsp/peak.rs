//! Benchmarks for the peak envelope follower.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fluxscope::dsp::peak::PeakEnvelopeTracker;

use crate::BLOCK_SIZES;

pub fn bench_peak(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/peak");

    for &size in BLOCK_SIZES {
        let tone = crate::sine(size);

        for window in [1usize, 15] {
            let mut tracker = PeakEnvelopeTracker::new(window);
            group.bench_with_input(
                BenchmarkId::new(format!("window_{window}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let mut peak = 0.0;
                        for &sample in &tone {
                            peak = tracker.run(black_box(sample));
                        }
                        peak
                    })
                },
            );
        }
    }

    group.finish();
}

//! Benchmarks for the realtime -> UI block handoff.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fluxscope::{handoff, MAX_BLOCK_SIZE};

use crate::BLOCK_SIZES;

pub fn bench_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/handoff");

    for &size in BLOCK_SIZES {
        // Stereo interleaved, as delivered by the input callback.
        let interleaved: Vec<f32> = crate::sine(size * 2);
        let (mut producer, mut consumer) = handoff::channel(2, MAX_BLOCK_SIZE, 4);

        group.bench_with_input(
            BenchmarkId::new("publish_and_drain", size),
            &size,
            |b, _| {
                b.iter(|| {
                    producer.publish_interleaved(black_box(&interleaved), 2);
                    consumer.drain(|block| {
                        black_box(block.frames());
                    })
                })
            },
        );
    }

    group.finish();
}

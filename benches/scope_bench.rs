//! Benchmarks for the capture path and display reduction.
//!
//! Run with: cargo bench
//!
//! Ingest runs once per audio block on the UI thread and must keep up with
//! the input; the reducer runs at most once per tick.
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms of audio
//!   - 128 samples = 2.67ms of audio
//!   - 256 samples = 5.33ms of audio
//!   - 512 samples = 10.67ms of audio
//!
//! Benchmark groups:
//!   - dsp/*        Trigger scanning and peak tracking
//!   - scenarios/*  Engine ingest, reduction and the block handoff

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

/// A test tone: 440 Hz sine at 48 kHz.
pub fn sine(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 48_000.0).sin() * 0.8)
        .collect()
}

criterion_group!(
    benches,
    dsp::bench_trigger,
    dsp::bench_peak,
    scenarios::bench_ingest,
    scenarios::bench_handoff,
);
criterion_main!(benches);

//! Benchmarks for low-level detection primitives.

mod peak;
mod trigger;

pub use peak::bench_peak;
pub use trigger::bench_trigger;

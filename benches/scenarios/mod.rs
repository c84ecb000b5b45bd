//! Real-world scenario benchmarks.
//!
//! These model what one UI tick costs: draining the handoff and ingesting
//! into an engine at typical display settings.

mod handoff;
mod ingest;

pub use handoff::bench_handoff;
pub use ingest::bench_ingest;

//! Low-level signal primitives used by the capture and display stages.
//!
//! These components are allocation-free once constructed, making them safe to
//! run per sample inside the ingest path. They stay focused on the per-sample
//! math so the capture buffer and reducer can layer on orchestration.

/// Peak-hold envelope follower used for zoomed-out display columns.
pub mod peak;
/// Level-crossing edge detection for sweep synchronisation.
pub mod trigger;

pub use peak::PeakEnvelopeTracker;
pub use trigger::{find_edge, TriggerMode, TriggerState};

pub mod capture; // Triggered / free-running sweep capture
pub mod display; // Pixel-resolution reduction of the capture
pub mod dsp;
pub mod engine; // Orchestration and configuration
pub mod error;
#[cfg(feature = "rtrb")]
pub mod handoff; // Realtime thread -> UI thread block transfer
#[cfg(feature = "rtrb")]
pub mod io;
pub mod settings; // Flat section.key=value persistence

pub use capture::{CaptureBuffer, IngestReport};
pub use display::{ColumnColor, DisplayCoordinate, DisplayReducer, ReductionMode};
pub use engine::{CursorReadout, EngineConfig, ScopeEngine, ScrollSplit};
pub use error::{BackendError, ScopeError, SettingsError};

/// Largest number of frames a single handoff descriptor carries.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Upper bound on simultaneously displayed channels.
pub const MAX_CHANNELS: usize = 8;
/// Sample rate assumed while no backend is connected.
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

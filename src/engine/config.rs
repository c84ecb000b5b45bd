#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_SAMPLE_RATE, MAX_CHANNELS};

pub const MIN_VERTICAL_SCALING: f32 = 0.1;
pub const MAX_VERTICAL_SCALING: f32 = 100.0;

/// Persisted parameter names of the `OscWindow` section.
pub mod params {
    pub const SECTION: &str = "OscWindow";

    pub const VERTICAL_SCALING: &str = "verticalScaling";
    pub const DISPLAY_TIME: &str = "displayTime";
    pub const TRIGGER_ENABLED: &str = "triggerEnabled";
    pub const TRIGGER_POSITIVE: &str = "triggerPositive";
    pub const TRIGGER_LEVEL: &str = "triggerLevel";

    /// Restore order: scaling first so the trigger level clamp sees it.
    pub const ALL: &[&str] = &[
        VERTICAL_SCALING,
        DISPLAY_TIME,
        TRIGGER_ENABLED,
        TRIGGER_POSITIVE,
        TRIGGER_LEVEL,
    ];
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Seconds of audio shown across the display.
    pub display_time: f32,
    /// Vertical zoom factor, `[0.1, 100]`.
    pub vertical_scaling: f32,
    pub sample_rate: f32,
    pub channels: usize,
    pub trigger_enabled: bool,
    pub trigger_positive: bool,
    pub trigger_level: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_time: 0.01,
            vertical_scaling: 1.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            trigger_enabled: true,
            trigger_positive: true,
            trigger_level: 0.2,
        }
    }
}

pub fn clamp_vertical_scaling(scaling: f32) -> f32 {
    if scaling.is_nan() {
        return 1.0;
    }
    scaling.clamp(MIN_VERTICAL_SCALING, MAX_VERTICAL_SCALING)
}

/// Keep a trigger level on screen: `[-1/scaling, 1/scaling]`.
pub fn clamp_trigger_level(level: f32, vertical_scaling: f32) -> f32 {
    let bound = 1.0 / vertical_scaling;
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(-bound, bound)
}

pub fn sanitize_sample_rate(rate: f32) -> f32 {
    if rate.is_finite() && rate >= 1.0 {
        rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

pub fn clamp_channels(channels: usize) -> usize {
    channels.clamp(1, MAX_CHANNELS)
}

impl EngineConfig {
    /// Bring every field into its documented range.
    pub fn sanitized(mut self) -> Self {
        self.sample_rate = sanitize_sample_rate(self.sample_rate);
        self.channels = clamp_channels(self.channels);
        self.vertical_scaling = clamp_vertical_scaling(self.vertical_scaling);
        self.trigger_level = clamp_trigger_level(self.trigger_level, self.vertical_scaling);
        self
    }
}

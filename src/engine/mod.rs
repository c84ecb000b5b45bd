//! Scope engine: owns configuration, the capture buffer and the reducer, and
//! answers the queries of the rendering/UI layer.
//!
//! The engine is driven from a single thread (the UI tick). Audio reaches it
//! through [`crate::handoff`]; nothing in here is shared across threads.

pub mod config;

use tracing::debug;

pub use self::config::{params, EngineConfig};
use self::config::{
    clamp_channels, clamp_trigger_level, clamp_vertical_scaling, sanitize_sample_rate,
};
use crate::{
    capture::{clamp_capture_len, CaptureBuffer, IngestReport},
    display::{ChannelTrace, DisplayReducer},
    dsp::trigger::{TriggerMode, TriggerState},
    error::{ScopeError, SettingsError},
    settings::{ParamValue, ParameterChange, ParameterSet},
};

/// Display-time change per pixel of horizontal drag, in seconds.
pub const DRAG_SECONDS_PER_PIXEL: f64 = 0.0001;
/// Vertical zoom step per mouse wheel notch.
pub const WHEEL_ZOOM_IN: f32 = 1.1;
pub const WHEEL_ZOOM_OUT: f32 = 0.9;

/// How free-run columns are laid out on screen.
///
/// The newest sample sits at the right edge: reduced columns `[end_index, W)`
/// are drawn at screen `[0, right)` and columns `[0, end_index)` at
/// `[right, W)`. Triggered sweeps use the identity layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSplit {
    pub end_index: usize,
    pub right: usize,
}

impl ScrollSplit {
    pub fn identity(width: usize) -> Self {
        Self {
            end_index: 0,
            right: width,
        }
    }

    /// Reduced column shown at `screen_x`.
    pub fn column_for_screen(&self, screen_x: usize) -> usize {
        if screen_x < self.right {
            self.end_index + screen_x
        } else {
            screen_x - self.right
        }
    }
}

/// Text overlay data for the cursor: `+{time_ms:.2}ms Value: {value:7.4}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorReadout {
    pub time_ms: f64,
    pub value: f32,
}

#[derive(Debug)]
pub struct ScopeEngine {
    config: EngineConfig,
    capture: CaptureBuffer,
    reducer: DisplayReducer,
    pixel_width: usize,
    /// Fill index the current traces were reduced at.
    reduced_fill: usize,
    dirty: bool,
    changes: Vec<ParameterChange>,
}

impl ScopeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let mut config = config.sanitized();
        let len = capture_len_for(config.display_time as f64, config.sample_rate);
        config.display_time = len as f32 / config.sample_rate;

        let trigger = TriggerState::new(
            config.trigger_enabled,
            config.trigger_positive,
            config.trigger_level,
        );
        Self {
            capture: CaptureBuffer::new(config.channels, len, trigger),
            reducer: DisplayReducer::new(config.channels),
            config,
            pixel_width: 0,
            reduced_fill: 0,
            dirty: false,
            changes: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capture(&self) -> &CaptureBuffer {
        &self.capture
    }

    pub fn reducer(&self) -> &DisplayReducer {
        &self.reducer
    }

    /// Current coordinate arrays, one trace per channel.
    pub fn traces(&self) -> &[ChannelTrace] {
        self.reducer.traces()
    }

    pub fn channels(&self) -> usize {
        self.config.channels
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn display_time(&self) -> f32 {
        self.config.display_time
    }

    pub fn display_samples(&self) -> usize {
        self.capture.len()
    }

    pub fn vertical_scaling(&self) -> f32 {
        self.config.vertical_scaling
    }

    pub fn trigger_enabled(&self) -> bool {
        self.config.trigger_enabled
    }

    pub fn trigger_positive(&self) -> bool {
        self.config.trigger_positive
    }

    pub fn trigger_level(&self) -> f32 {
        self.config.trigger_level
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        TriggerMode::from_flags(self.config.trigger_enabled, self.config.trigger_positive)
    }

    pub fn pixel_width(&self) -> usize {
        self.pixel_width
    }

    /// Values the engine adjusted on its own since the last call, at most
    /// one per parameter (the latest value).
    pub fn drain_parameter_changes(&mut self) -> impl Iterator<Item = ParameterChange> + '_ {
        self.changes.drain(..)
    }

    fn notify(&mut self, name: &'static str, value: ParamValue) {
        match self.changes.iter_mut().find(|change| change.name == name) {
            Some(change) => change.value = value,
            None => self.changes.push(ParameterChange { name, value }),
        }
    }

    fn refresh(&mut self) {
        self.reducer.refresh(&self.capture, self.pixel_width);
        self.reduced_fill = self.capture.fill_index();
        self.dirty = false;
    }

    /// Whether ingested audio is not yet reflected in the traces.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Run the reducer if ingest changed the displayable content since the
    /// last pass. Call once per frame, after draining audio.
    pub fn refresh_if_dirty(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.refresh();
        true
    }

    pub fn set_display_time(&mut self, seconds: f64) {
        let len = capture_len_for(seconds, self.config.sample_rate);
        self.set_display_samples(len);
        if (self.config.display_time as f64 - seconds).abs() > f64::from(f32::EPSILON) {
            self.notify(
                params::DISPLAY_TIME,
                ParamValue::Float(self.config.display_time),
            );
        }
    }

    /// Resize the capture to `frames` (clamped to `[10, rate * 10]`).
    pub fn set_display_samples(&mut self, frames: usize) {
        let len = clamp_capture_len(frames, self.config.sample_rate);
        if len != self.capture.len() {
            self.capture.resize(self.config.channels, len);
        }
        self.config.display_time = len as f32 / self.config.sample_rate;
        self.refresh();
    }

    /// Horizontal drag: positive `pixels` lengthen the display time.
    pub fn nudge_display_time(&mut self, pixels: i32) {
        let seconds = self.config.display_time as f64 + pixels as f64 * DRAG_SECONDS_PER_PIXEL;
        self.set_display_samples(capture_len_for(seconds, self.config.sample_rate));
        self.notify(
            params::DISPLAY_TIME,
            ParamValue::Float(self.config.display_time),
        );
    }

    pub fn set_trigger(&mut self, enabled: bool, positive: bool, level: f32) {
        self.set_trigger_positive(positive);
        self.set_trigger_level(level);
        self.set_trigger_enabled(enabled);
    }

    pub fn set_trigger_mode(&mut self, mode: TriggerMode) {
        if mode.is_enabled() {
            self.set_trigger_positive(mode.is_positive());
        }
        self.set_trigger_enabled(mode.is_enabled());
    }

    pub fn set_trigger_enabled(&mut self, enabled: bool) {
        if self.config.trigger_enabled == enabled {
            return;
        }
        self.config.trigger_enabled = enabled;
        self.capture.set_trigger_enabled(enabled);
        self.refresh();
    }

    pub fn set_trigger_positive(&mut self, positive: bool) {
        self.config.trigger_positive = positive;
        self.capture.set_trigger_positive(positive);
    }

    /// Set the trigger level, clamped to the visible range.
    pub fn set_trigger_level(&mut self, level: f32) {
        let clamped = self.apply_trigger_level(level);
        if clamped != level {
            self.notify(params::TRIGGER_LEVEL, ParamValue::Float(clamped));
        }
    }

    fn apply_trigger_level(&mut self, level: f32) -> f32 {
        let clamped = clamp_trigger_level(level, self.config.vertical_scaling);
        self.config.trigger_level = clamped;
        self.capture.set_trigger_level(clamped);
        clamped
    }

    /// Place the trigger level at row `y` of a channel `channel_height` rows
    /// tall. Ignored while the trigger is off.
    pub fn set_trigger_level_from_pixel(&mut self, y: f32, channel_height: f32) {
        if !self.config.trigger_enabled || channel_height <= 0.0 {
            return;
        }
        let y = y.rem_euclid(channel_height);
        let level = (channel_height * 0.5 - y) / self.config.vertical_scaling / channel_height * 2.0;
        let clamped = self.apply_trigger_level(level);
        self.notify(params::TRIGGER_LEVEL, ParamValue::Float(clamped));
    }

    /// Set the vertical zoom (clamped to `[0.1, 100]`) and pull the trigger
    /// level back into the visible range.
    pub fn set_vertical_scaling(&mut self, scaling: f32) {
        let clamped = clamp_vertical_scaling(scaling);
        self.config.vertical_scaling = clamped;
        if clamped != scaling {
            self.notify(params::VERTICAL_SCALING, ParamValue::Float(clamped));
        }
        self.set_trigger_level(self.config.trigger_level);
    }

    /// Mouse wheel zoom; `factor` is usually [`WHEEL_ZOOM_IN`] or [`WHEEL_ZOOM_OUT`].
    pub fn zoom_vertical(&mut self, factor: f32) {
        self.set_vertical_scaling(self.config.vertical_scaling * factor);
        self.notify(
            params::VERTICAL_SCALING,
            ParamValue::Float(self.config.vertical_scaling),
        );
    }

    /// Adopt the backend's rate, keeping the display time. Always safe.
    pub fn set_sampling_rate(&mut self, rate: f32) {
        let rate = sanitize_sample_rate(rate);
        if rate == self.config.sample_rate {
            return;
        }
        debug!(rate, "sampling rate changed");
        let seconds = self.config.display_time as f64;
        self.config.sample_rate = rate;
        self.set_display_samples(capture_len_for(seconds, rate));
    }

    /// Reallocate for a new channel count (clamped to `[1, 8]`). Always safe.
    pub fn set_channels(&mut self, channels: usize) {
        let channels = clamp_channels(channels);
        if channels == self.config.channels {
            return;
        }
        debug!(channels, "channel count changed");
        self.config.channels = channels;
        self.capture.resize(channels, self.capture.len());
        self.reducer.set_channels(channels);
        self.refresh();
    }

    pub fn set_pixel_width(&mut self, width: usize) {
        if width == self.pixel_width {
            return;
        }
        self.pixel_width = width;
        self.refresh();
    }

    /// Per-block entry point. The channel count is `channel_blocks.len()`.
    ///
    /// Ingest only marks the traces stale: after every free-run write, and
    /// on completed sweeps when triggered. The reducer runs in
    /// [`refresh_if_dirty`](Self::refresh_if_dirty), once per frame however
    /// many blocks arrived. A call without channel blocks discards every frame.
    pub fn ingest(&mut self, channel_blocks: &[&[f32]], frame_count: usize) -> IngestReport {
        if channel_blocks.is_empty() {
            return IngestReport {
                discarded: frame_count,
                ..IngestReport::default()
            };
        }
        self.set_channels(channel_blocks.len());

        let blocks = &channel_blocks[..channel_blocks.len().min(self.config.channels)];
        let report = self.capture.ingest(blocks, frame_count);

        let changed = if self.config.trigger_enabled {
            report.sweeps_completed > 0
        } else {
            report.written > 0
        };
        self.dirty |= changed;
        report
    }

    pub fn scroll_split(&self) -> ScrollSplit {
        let width = self.pixel_width;
        if self.config.trigger_enabled || width == 0 {
            return ScrollSplit::identity(width);
        }
        let end_index = (self.reduced_fill * width / self.capture.len()).min(width);
        ScrollSplit {
            end_index,
            right: width - end_index,
        }
    }

    fn check_cursor(&self, pixel_x: usize, channel: usize) -> Result<(), ScopeError> {
        if channel >= self.config.channels {
            return Err(ScopeError::ChannelOutOfRange {
                channel,
                channels: self.config.channels,
            });
        }
        if pixel_x >= self.pixel_width {
            return Err(ScopeError::PixelOutOfRange {
                x: pixel_x,
                width: self.pixel_width,
            });
        }
        Ok(())
    }

    /// Displayed value under screen column `pixel_x` of `channel`.
    pub fn value_at_cursor(&self, pixel_x: usize, channel: usize) -> Result<f32, ScopeError> {
        self.check_cursor(pixel_x, channel)?;
        let column = self.scroll_split().column_for_screen(pixel_x);
        self.reducer
            .column_value(channel, column)
            .ok_or(ScopeError::PixelOutOfRange {
                x: pixel_x,
                width: self.pixel_width,
            })
    }

    pub fn cursor_readout(&self, pixel_x: usize, channel: usize) -> Result<CursorReadout, ScopeError> {
        let value = self.value_at_cursor(pixel_x, channel)?;
        let position = pixel_x as f64 / self.pixel_width as f64;
        let time_ms =
            position * self.capture.len() as f64 / self.config.sample_rate as f64 * 1000.0;
        Ok(CursorReadout { time_ms, value })
    }
}

impl Default for ScopeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn capture_len_for(seconds: f64, sample_rate: f32) -> usize {
    let frames = (seconds * sample_rate as f64).round();
    // NaN and negatives saturate to 0 and are clamped up.
    clamp_capture_len(frames as usize, sample_rate)
}

impl ParameterSet for ScopeEngine {
    fn section(&self) -> &'static str {
        params::SECTION
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        params::ALL
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        let value = match name {
            params::VERTICAL_SCALING => ParamValue::Float(self.config.vertical_scaling),
            params::DISPLAY_TIME => ParamValue::Float(self.config.display_time),
            params::TRIGGER_ENABLED => ParamValue::Bool(self.config.trigger_enabled),
            params::TRIGGER_POSITIVE => ParamValue::Bool(self.config.trigger_positive),
            params::TRIGGER_LEVEL => ParamValue::Float(self.config.trigger_level),
            _ => return None,
        };
        Some(value)
    }

    fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), SettingsError> {
        let mismatch = |expected| SettingsError::TypeMismatch {
            name: name.to_owned(),
            expected,
        };
        match name {
            params::VERTICAL_SCALING => {
                self.set_vertical_scaling(value.as_float().ok_or_else(|| mismatch("float"))?)
            }
            params::DISPLAY_TIME => {
                let seconds = value.as_float().ok_or_else(|| mismatch("float"))?;
                self.set_display_time(seconds as f64)
            }
            params::TRIGGER_ENABLED => {
                self.set_trigger_enabled(value.as_bool().ok_or_else(|| mismatch("bool"))?)
            }
            params::TRIGGER_POSITIVE => {
                self.set_trigger_positive(value.as_bool().ok_or_else(|| mismatch("bool"))?)
            }
            params::TRIGGER_LEVEL => {
                self.set_trigger_level(value.as_float().ok_or_else(|| mismatch("float"))?)
            }
            _ => {
                return Err(SettingsError::UnknownParameter {
                    section: params::SECTION.to_owned(),
                    name: name.to_owned(),
                })
            }
        }
        Ok(())
    }
}

//! Reduction of the captured sweep to one value per display column.
//!
//! Below 2.5 samples per pixel each column shows the nearest raw sample.
//! Above it, a column would skip samples, so every sample of the column is run
//! through the channel's [`PeakEnvelopeTracker`] and the column becomes a
//! vertical segment between `+peak` and `-peak`.

use crate::{capture::CaptureBuffer, dsp::peak::PeakEnvelopeTracker};

/// Samples-per-pixel ratio above which columns switch to the envelope.
pub const ENVELOPE_THRESHOLD: f64 = 2.5;
/// Magnitude above which the trace blends towards the hot color.
pub const CLIP_WARNING_LEVEL: f32 = 0.75;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayCoordinate {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColumnColor {
    pub const QUIET: ColumnColor = ColumnColor::new(0.05, 0.45, 0.12);
    pub const TRACE: ColumnColor = ColumnColor::new(0.1, 1.0, 0.25);
    pub const HOT: ColumnColor = ColumnColor::new(1.0, 0.25, 0.1);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: ColumnColor, t: f32) -> Self {
        if t >= 1.0 {
            return other;
        }
        let t = t.max(0.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }

    /// Color for a column whose magnitude is `|value|`.
    pub fn for_level(value: f32) -> Self {
        let level = value.abs();
        if level <= CLIP_WARNING_LEVEL {
            Self::QUIET.lerp(Self::TRACE, level / CLIP_WARNING_LEVEL)
        } else {
            let t = (level - CLIP_WARNING_LEVEL) / (1.0 - CLIP_WARNING_LEVEL);
            Self::TRACE.lerp(Self::HOT, t)
        }
    }

    /// 8-bit RGB, for renderers that want integer colors.
    pub fn to_rgb8(self) -> (u8, u8, u8) {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionMode {
    #[default]
    Direct,
    Envelope,
}

impl ReductionMode {
    pub fn for_ratio(samples_per_pixel: f64) -> Self {
        if samples_per_pixel > ENVELOPE_THRESHOLD {
            ReductionMode::Envelope
        } else {
            ReductionMode::Direct
        }
    }

    /// Coordinates emitted per column.
    pub fn points_per_column(self) -> usize {
        match self {
            ReductionMode::Direct => 1,
            ReductionMode::Envelope => 2,
        }
    }
}

/// Reduced data of one channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelTrace {
    /// One point per column (direct) or a `+peak, -peak` pair per column (envelope).
    pub points: Vec<DisplayCoordinate>,
    pub colors: Vec<ColumnColor>,
}

impl ChannelTrace {
    fn resize(&mut self, width: usize, mode: ReductionMode) {
        self.points
            .resize(width * mode.points_per_column(), DisplayCoordinate::default());
        self.colors.resize(width, ColumnColor::default());
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisplayReducer {
    traces: Vec<ChannelTrace>,
    trackers: Vec<PeakEnvelopeTracker>,
    pixel_width: usize,
    mode: ReductionMode,
    samples_per_pixel: f64,
    passes: u64,
}

impl DisplayReducer {
    pub fn new(channels: usize) -> Self {
        let mut reducer = Self::default();
        reducer.set_channels(channels);
        reducer
    }

    pub fn set_channels(&mut self, channels: usize) {
        self.traces.resize_with(channels, ChannelTrace::default);
        self.trackers.resize_with(channels, PeakEnvelopeTracker::default);
    }

    pub fn pixel_width(&self) -> usize {
        self.pixel_width
    }

    pub fn mode(&self) -> ReductionMode {
        self.mode
    }

    pub fn samples_per_pixel(&self) -> f64 {
        self.samples_per_pixel
    }

    /// Completed reduction passes since construction.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn traces(&self) -> &[ChannelTrace] {
        &self.traces
    }

    pub fn trace(&self, channel: usize) -> Option<&ChannelTrace> {
        self.traces.get(channel)
    }

    /// Value shown at a column: the sample (direct) or the positive peak (envelope).
    pub fn column_value(&self, channel: usize, column: usize) -> Option<f32> {
        let trace = self.traces.get(channel)?;
        trace
            .points
            .get(column * self.mode.points_per_column())
            .map(|point| point.y)
    }

    /// Recompute every channel trace for a display `pixel_width` columns wide.
    pub fn refresh(&mut self, capture: &CaptureBuffer, pixel_width: usize) {
        if self.traces.len() != capture.channels() {
            self.set_channels(capture.channels());
        }

        self.pixel_width = pixel_width;
        self.passes += 1;
        if pixel_width == 0 || capture.is_empty() {
            for trace in &mut self.traces {
                trace.points.clear();
                trace.colors.clear();
            }
            return;
        }

        let len = capture.len();
        let spp = len as f64 / pixel_width as f64;
        self.samples_per_pixel = spp;
        self.mode = ReductionMode::for_ratio(spp);
        let window = PeakEnvelopeTracker::window_for_ratio(spp);

        for (ch, (trace, tracker)) in self
            .traces
            .iter_mut()
            .zip(self.trackers.iter_mut())
            .enumerate()
        {
            let Some(samples) = capture.channel(ch) else {
                continue;
            };
            trace.resize(pixel_width, self.mode);

            match self.mode {
                ReductionMode::Direct => reduce_direct(trace, samples, spp),
                ReductionMode::Envelope => {
                    tracker.set_window_size(window);
                    tracker.reset();
                    reduce_envelope(trace, tracker, samples, spp);
                }
            }
        }
    }
}

fn reduce_direct(trace: &mut ChannelTrace, samples: &[f32], spp: f64) {
    let last = samples.len() - 1;
    for (column, (point, color)) in trace
        .points
        .iter_mut()
        .zip(trace.colors.iter_mut())
        .enumerate()
    {
        let idx = ((column as f64 * spp).round() as usize).min(last);
        let value = samples[idx];
        *point = DisplayCoordinate {
            x: column as f32,
            y: value,
        };
        *color = ColumnColor::for_level(value);
    }
}

fn reduce_envelope(
    trace: &mut ChannelTrace,
    tracker: &mut PeakEnvelopeTracker,
    samples: &[f32],
    spp: f64,
) {
    let len = samples.len();
    let width = trace.colors.len();
    for column in 0..width {
        let start = ((column as f64 * spp) as usize).min(len);
        let end = if column + 1 == width {
            len
        } else {
            (((column + 1) as f64 * spp) as usize).min(len)
        };

        let mut peak = tracker.filtered_peak();
        for &sample in &samples[start..end] {
            peak = tracker.run(sample);
        }

        let x = column as f32;
        trace.points[column * 2] = DisplayCoordinate { x, y: peak };
        trace.points[column * 2 + 1] = DisplayCoordinate { x, y: -peak };
        trace.colors[column] = ColumnColor::for_level(peak);
    }
}

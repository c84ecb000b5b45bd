/// Capacity of the sample history ring.
pub const HISTORY_LEN: usize = 16;
/// Largest usable window; one slot of the ring stays free.
pub const MAX_WINDOW: usize = HISTORY_LEN - 1;

const ATTACK_RATIO: f32 = 10.0;

/// Sliding-window peak detector followed by an asymmetric one-pole smoother.
///
/// The raw peak is the largest magnitude over the last `window_size` samples.
/// The smoothed output chases rising peaks with the attack step and falls back
/// with the (ten times slower) release step, which gives a peak-hold look that
/// does not flicker when many samples collapse into one display column.
#[derive(Debug, Clone)]
pub struct PeakEnvelopeTracker {
    history: [f32; HISTORY_LEN],
    write_pos: usize,
    window_size: usize,
    peak: f32,
    filtered_peak: f32,
    attack_step: f32,
    release_step: f32,
}

impl PeakEnvelopeTracker {
    pub fn new(window_size: usize) -> Self {
        let mut tracker = Self {
            history: [0.0; HISTORY_LEN],
            write_pos: 0,
            window_size: 1,
            peak: 0.0,
            filtered_peak: 0.0,
            attack_step: 1.0,
            release_step: 1.0,
        };
        tracker.set_window_size(window_size);
        tracker
    }

    /// Window size to use for a given samples-per-pixel ratio.
    pub fn window_for_ratio(samples_per_pixel: f64) -> usize {
        (samples_per_pixel.round().max(1.0) as usize).min(MAX_WINDOW)
    }

    /// Set the window (clamped to `[1, 15]`) and derive the smoothing steps.
    pub fn set_window_size(&mut self, window_size: usize) {
        self.window_size = window_size.clamp(1, MAX_WINDOW);
        self.release_step = 1.0 / (self.window_size as f32 * 4.0 + 1.0);
        self.attack_step = (self.release_step * ATTACK_RATIO).min(1.0);
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn attack_step(&self) -> f32 {
        self.attack_step
    }

    pub fn release_step(&self) -> f32 {
        self.release_step
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn filtered_peak(&self) -> f32 {
        self.filtered_peak
    }

    /// Push one sample and return the smoothed peak.
    #[inline]
    pub fn run(&mut self, sample: f32) -> f32 {
        self.history[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % HISTORY_LEN;

        let mut peak = 0.0f32;
        for back in 1..=self.window_size {
            let idx = (self.write_pos + HISTORY_LEN - back) % HISTORY_LEN;
            peak = peak.max(self.history[idx].abs());
        }
        self.peak = peak;

        let step = if peak > self.filtered_peak {
            self.attack_step
        } else {
            self.release_step
        };
        self.filtered_peak += step * (peak - self.filtered_peak);
        self.filtered_peak
    }

    /// Forget history so the next pass starts from silence.
    pub fn reset(&mut self) {
        self.history = [0.0; HISTORY_LEN];
        self.write_pos = 0;
        self.peak = 0.0;
        self.filtered_peak = 0.0;
    }
}

impl Default for PeakEnvelopeTracker {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_fast_and_decays_slowly() {
        let mut tracker = PeakEnvelopeTracker::new(3);
        let out: Vec<f32> = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
            .iter()
            .map(|&s| tracker.run(s))
            .collect();

        assert_eq!(&out[..3], &[0.0, 0.0, 0.0]);
        assert!(out[3] > 0.5, "attack should jump on the impulse, got {}", out[3]);
        // The impulse stays inside the 3-sample window for two more samples.
        assert!(out[4] >= out[3]);
        assert!(out[5] >= out[4]);
        // Then the release takes over, slowly.
        assert!(out[6] < out[5]);
        assert!(out[5] - out[6] < out[3] - out[2]);
        assert!(out[6] > 0.5);
    }

    #[test]
    fn attack_is_ten_times_release() {
        let tracker = PeakEnvelopeTracker::new(4);
        let ratio = tracker.attack_step() / tracker.release_step();
        assert!((ratio - 10.0).abs() < 1e-4);
        assert!(tracker.attack_step() <= 1.0);
    }

    #[test]
    fn window_size_is_clamped() {
        assert_eq!(PeakEnvelopeTracker::new(0).window_size(), 1);
        assert_eq!(PeakEnvelopeTracker::new(64).window_size(), MAX_WINDOW);
        assert_eq!(PeakEnvelopeTracker::window_for_ratio(0.3), 1);
        assert_eq!(PeakEnvelopeTracker::window_for_ratio(7.6), 8);
        assert_eq!(PeakEnvelopeTracker::window_for_ratio(1000.0), MAX_WINDOW);
    }

    #[test]
    fn peak_uses_magnitude_over_window_only() {
        let mut tracker = PeakEnvelopeTracker::new(2);
        tracker.run(-0.9);
        tracker.run(0.1);
        assert!((tracker.peak() - 0.9).abs() < 1e-6);
        tracker.run(0.2);
        assert!((tracker.peak() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn reset_returns_to_silence() {
        let mut tracker = PeakEnvelopeTracker::new(5);
        for _ in 0..32 {
            tracker.run(0.8);
        }
        tracker.reset();
        assert_eq!(tracker.filtered_peak(), 0.0);
        assert_eq!(tracker.run(0.0), 0.0);
    }
}

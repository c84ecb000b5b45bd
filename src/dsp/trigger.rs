#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Edge Trigger
============

A trigger re-synchronises successive sweeps to the same point of a periodic
signal, so the waveform stands still on screen instead of scrolling.

  level        Threshold in linear amplitude the signal has to cross.

  direction    Rising (positive) fires when the signal goes up through the
               level, falling fires when it goes down through it.

  prev_sample  The sample inspected just before the current one. It is kept
               in the state (not on the stack) so a crossing that straddles
               two audio blocks is still detected.


The Predicate
-------------

         rising                       falling

    cur ●                        prev ●
        │                             │
  ──────┼──────── level        ───────┼─────── level
        │                             │
   prev ●                             ● cur

    rising:   prev <= level && cur >= level
    falling:  prev >= level && cur <= level

Both comparisons are inclusive, so a signal that touches the level exactly
(or sits on it) counts as a crossing. The offset reported is that of `cur`:
the first sample at or past the level.
*/

/// The three trigger choices offered to the user.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// Free-running capture, no synchronisation.
    Off,
    #[default]
    Rising,
    Falling,
}

impl TriggerMode {
    pub fn from_flags(enabled: bool, positive: bool) -> Self {
        match (enabled, positive) {
            (false, _) => TriggerMode::Off,
            (true, true) => TriggerMode::Rising,
            (true, false) => TriggerMode::Falling,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != TriggerMode::Off
    }

    /// Direction flag; `Off` keeps the rising default.
    pub fn is_positive(self) -> bool {
        self != TriggerMode::Falling
    }

    /// Cycle Off -> Rising -> Falling -> Off.
    pub fn next(self) -> Self {
        match self {
            TriggerMode::Off => TriggerMode::Rising,
            TriggerMode::Rising => TriggerMode::Falling,
            TriggerMode::Falling => TriggerMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TriggerMode::Off => "Off",
            TriggerMode::Rising => "Rising Edge",
            TriggerMode::Falling => "Falling Edge",
        }
    }
}

/// Trigger configuration plus the one sample of history the scan needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerState {
    pub enabled: bool,
    /// Rising edge when true, falling edge otherwise.
    pub positive: bool,
    pub level: f32,
    pub prev_sample: f32,
}

impl TriggerState {
    pub fn new(enabled: bool, positive: bool, level: f32) -> Self {
        Self {
            enabled,
            positive,
            level,
            prev_sample: 0.0,
        }
    }

    pub fn mode(&self) -> TriggerMode {
        TriggerMode::from_flags(self.enabled, self.positive)
    }

    pub fn set_mode(&mut self, mode: TriggerMode) {
        self.enabled = mode.is_enabled();
        if mode.is_enabled() {
            self.positive = mode.is_positive();
        }
    }

    #[inline]
    fn crosses(&self, prev: f32, cur: f32) -> bool {
        if self.positive {
            prev <= self.level && cur >= self.level
        } else {
            prev >= self.level && cur <= self.level
        }
    }
}

impl Default for TriggerState {
    fn default() -> Self {
        Self::new(true, true, 0.2)
    }
}

/// Return the offset of the first sample completing an edge, or `None`.
///
/// `prev_sample` is advanced over every inspected sample, including the one
/// that fires; samples after the edge are left uninspected.
pub fn find_edge(samples: &[f32], state: &mut TriggerState) -> Option<usize> {
    for (i, &sample) in samples.iter().enumerate() {
        let fired = state.crosses(state.prev_sample, sample);
        state.prev_sample = sample;
        if fired {
            return Some(i);
        }
    }
    None
}

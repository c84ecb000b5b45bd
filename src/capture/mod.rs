//! Multichannel sweep capture.
//!
//! Two banks of per-channel sample vectors are kept. In free-run mode samples
//! are written straight into the front bank, circularly. In triggered mode a
//! sweep is assembled in the back bank and the banks are swapped once it is
//! complete, so the front bank only ever holds whole sweeps.

use tracing::{debug, warn};

use crate::dsp::trigger::{find_edge, TriggerState};

/// Smallest capture length in frames.
pub const MIN_CAPTURE_FRAMES: usize = 10;
/// Longest capture, expressed in seconds of audio.
pub const MAX_CAPTURE_SECONDS: f32 = 10.0;

/// Clamp a requested capture length to `[10, sample_rate * 10]`.
pub fn clamp_capture_len(frames: usize, sample_rate: f32) -> usize {
    let max = ((sample_rate * MAX_CAPTURE_SECONDS) as usize).max(MIN_CAPTURE_FRAMES);
    frames.clamp(MIN_CAPTURE_FRAMES, max)
}

/// What happened to the frames of one ingest call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Frames copied into the capture.
    pub written: usize,
    /// Frames dropped while waiting for a trigger edge, plus frames a short
    /// channel block could not supply.
    pub discarded: usize,
    /// Triggered sweeps that reached full length during the call.
    pub sweeps_completed: usize,
}

impl IngestReport {
    pub fn frames(&self) -> usize {
        self.written + self.discarded
    }
}

#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    front: Vec<Vec<f32>>,
    back: Vec<Vec<f32>>,
    len: usize,
    fill_index: usize,
    trigger: TriggerState,
}

impl CaptureBuffer {
    pub fn new(channels: usize, len: usize, trigger: TriggerState) -> Self {
        let channels = channels.max(1);
        let len = len.max(1);
        Self {
            front: vec![vec![0.0; len]; channels],
            back: vec![vec![0.0; len]; channels],
            len,
            fill_index: if trigger.enabled { len } else { 0 },
            trigger,
        }
    }

    pub fn channels(&self) -> usize {
        self.front.len()
    }

    /// Frames per channel (N).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn fill_index(&self) -> usize {
        self.fill_index
    }

    pub fn trigger(&self) -> &TriggerState {
        &self.trigger
    }

    /// The displayable samples of one channel.
    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        self.front.get(channel).map(Vec::as_slice)
    }

    /// Whether a triggered sweep is complete and an edge is being searched.
    pub fn is_armed(&self) -> bool {
        self.trigger.enabled && self.fill_index >= self.len
    }

    /// Reallocate for a new shape and clear all content.
    ///
    /// Called only between ingest calls, so a block never sees two lengths.
    pub fn resize(&mut self, channels: usize, len: usize) {
        let channels = channels.max(1);
        let len = len.max(1);
        debug!(channels, len, "reallocating capture buffer");
        self.front = vec![vec![0.0; len]; channels];
        self.back = vec![vec![0.0; len]; channels];
        self.len = len;
        self.restart();
    }

    pub fn clear(&mut self) {
        for bank in self.front.iter_mut().chain(self.back.iter_mut()) {
            bank.fill(0.0);
        }
        self.restart();
    }

    /// Triggered captures wait for the next edge, free-running ones start over.
    fn restart(&mut self) {
        self.fill_index = if self.trigger.enabled { self.len } else { 0 };
    }

    /// Switch trigger on or off. Enabling arms the capture so the next sweep
    /// starts on an edge; disabling resumes circular writes from the start.
    pub fn set_trigger_enabled(&mut self, enabled: bool) {
        if self.trigger.enabled == enabled {
            return;
        }
        self.trigger.enabled = enabled;
        self.restart();
    }

    pub fn set_trigger_positive(&mut self, positive: bool) {
        self.trigger.positive = positive;
    }

    pub fn set_trigger_level(&mut self, level: f32) {
        self.trigger.level = level;
    }

    /// Consume `frame_count` frames of planar audio.
    ///
    /// Channels missing from `channel_blocks` are written as silence. Blocks
    /// shorter than `frame_count` shorten the write to the shortest block, and
    /// the frames past it are reported as discarded, so
    /// `written + discarded == frame_count` always holds.
    pub fn ingest(&mut self, channel_blocks: &[&[f32]], frame_count: usize) -> IngestReport {
        let frames = channel_blocks
            .iter()
            .take(self.channels())
            .fold(frame_count, |acc, block| acc.min(block.len()));
        let frames = if channel_blocks.is_empty() { 0 } else { frames };
        let short = frame_count - frames;
        if short > 0 {
            warn!(frame_count, frames, "channel block shorter than frame count");
        }
        if frames == 0 {
            return IngestReport {
                discarded: short,
                ..IngestReport::default()
            };
        }

        let mut report = if self.trigger.enabled {
            self.ingest_triggered(channel_blocks, frames)
        } else {
            self.ingest_free_run(channel_blocks, frames)
        };
        report.discarded += short;
        report
    }

    fn ingest_free_run(&mut self, channel_blocks: &[&[f32]], frames: usize) -> IngestReport {
        let mut pos = 0;
        while pos < frames {
            let take = (frames - pos).min(self.len - self.fill_index);
            copy_frames(
                &mut self.front,
                channel_blocks,
                pos,
                self.fill_index,
                take,
            );
            pos += take;
            self.fill_index += take;
            if self.fill_index >= self.len {
                self.fill_index = 0;
            }
        }

        IngestReport {
            written: frames,
            ..IngestReport::default()
        }
    }

    fn ingest_triggered(&mut self, channel_blocks: &[&[f32]], frames: usize) -> IngestReport {
        let mut report = IngestReport::default();
        let source = channel_blocks[0];
        let mut pos = 0;

        while pos < frames {
            if self.fill_index < self.len {
                let take = (frames - pos).min(self.len - self.fill_index);
                copy_frames(&mut self.back, channel_blocks, pos, self.fill_index, take);
                // Keep edge history continuous across the filled stretch.
                self.trigger.prev_sample = source[pos + take - 1];
                pos += take;
                self.fill_index += take;
                report.written += take;

                if self.fill_index == self.len {
                    std::mem::swap(&mut self.front, &mut self.back);
                    report.sweeps_completed += 1;
                }
            } else {
                match find_edge(&source[pos..frames], &mut self.trigger) {
                    Some(offset) => {
                        report.discarded += offset;
                        pos += offset;
                        self.fill_index = 0;
                    }
                    None => {
                        report.discarded += frames - pos;
                        pos = frames;
                    }
                }
            }
        }

        report
    }
}

fn copy_frames(
    bank: &mut [Vec<f32>],
    channel_blocks: &[&[f32]],
    src_pos: usize,
    dst_pos: usize,
    count: usize,
) {
    for (ch, dst) in bank.iter_mut().enumerate() {
        let dst = &mut dst[dst_pos..dst_pos + count];
        match channel_blocks.get(ch) {
            Some(src) => dst.copy_from_slice(&src[src_pos..src_pos + count]),
            None => dst.fill(0.0),
        }
    }
}

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{capture::IngestReport, engine::ScopeEngine, MAX_CHANNELS};

/*
Block Handoff
=============

The audio callback runs on a realtime thread and must not allocate, lock or
wait. The scope engine runs on the UI thread. Blocks move between them
through a fixed pool of descriptors and two single-producer/single-consumer
rings:

                 filled ring
    producer  ────────────────►  consumer
   (callback) ◄────────────────  (UI tick)
                  free ring

  - All descriptors are allocated once, in `channel`, and start on the free
    ring.
  - The producer pops a free descriptor, copies the block into it and pushes
    it onto the filled ring.
  - The consumer pops filled descriptors, ingests them and pushes them back
    onto the free ring.

A descriptor is only ever reachable from one side, so the producer can never
overwrite a block the consumer is still reading. If the free ring is empty
the consumer has fallen behind by `depth` blocks: the new block is dropped
and counted as an overrun.
*/

/// One multichannel block of planar audio.
#[derive(Debug)]
pub struct AudioBlock {
    planes: Vec<Vec<f32>>,
    channels: usize,
    frames: usize,
}

impl AudioBlock {
    fn with_capacity(channels: usize, max_frames: usize) -> Self {
        Self {
            planes: vec![vec![0.0; max_frames]; channels],
            channels: 0,
            frames: 0,
        }
    }

    /// Channels carried by this block.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        if channel >= self.channels {
            return None;
        }
        self.planes.get(channel).map(|plane| &plane[..self.frames])
    }

    /// Feed the block to `engine`. Does not allocate.
    pub fn ingest_into(&self, engine: &mut ScopeEngine) -> IngestReport {
        let mut planes: [&[f32]; MAX_CHANNELS] = [&[]; MAX_CHANNELS];
        let channels = self.channels.min(MAX_CHANNELS);
        for (slot, plane) in planes.iter_mut().zip(&self.planes[..channels]) {
            *slot = &plane[..self.frames];
        }
        engine.ingest(&planes[..channels], self.frames)
    }
}

/// Create a handoff with `depth` descriptors of `channels` x `max_frames`.
pub fn channel(channels: usize, max_frames: usize, depth: usize) -> (BlockProducer, BlockConsumer) {
    let channels = channels.clamp(1, MAX_CHANNELS);
    let max_frames = max_frames.max(1);
    let depth = depth.max(1);

    let (mut free_tx, free_rx) = RingBuffer::<AudioBlock>::new(depth);
    let (filled_tx, filled_rx) = RingBuffer::<AudioBlock>::new(depth);
    for _ in 0..depth {
        // Capacity equals the pool size, so this cannot fail.
        let _ = free_tx.push(AudioBlock::with_capacity(channels, max_frames));
    }

    let overruns = Arc::new(AtomicU64::new(0));
    let producer = BlockProducer {
        free: free_rx,
        filled: filled_tx,
        channels,
        max_frames,
        overruns: Arc::clone(&overruns),
    };
    let consumer = BlockConsumer {
        filled: filled_rx,
        free: free_tx,
        overruns,
    };
    (producer, consumer)
}

/// Realtime side of the handoff.
pub struct BlockProducer {
    free: Consumer<AudioBlock>,
    filled: Producer<AudioBlock>,
    channels: usize,
    max_frames: usize,
    overruns: Arc<AtomicU64>,
}

impl BlockProducer {
    /// Publish planar audio, splitting it into descriptors of at most
    /// `max_frames`. Returns the number of frames published; the rest were
    /// dropped for lack of a free descriptor.
    pub fn publish_planar(&mut self, planes: &[&[f32]]) -> usize {
        let channels = planes.len().min(self.channels);
        let frames = planes[..channels]
            .iter()
            .map(|plane| plane.len())
            .min()
            .unwrap_or(0);

        let mut published = 0;
        while published < frames {
            let take = (frames - published).min(self.max_frames);
            let Some(mut block) = self.acquire() else {
                break;
            };
            for (dst, src) in block.planes.iter_mut().zip(&planes[..channels]) {
                dst[..take].copy_from_slice(&src[published..published + take]);
            }
            block.channels = channels;
            block.frames = take;
            self.submit(block);
            published += take;
        }
        published
    }

    /// Publish interleaved audio with `channels` samples per frame.
    /// Channels beyond the descriptor width are ignored.
    pub fn publish_interleaved(&mut self, data: &[f32], channels: usize) -> usize {
        if channels == 0 {
            return 0;
        }
        let frames = data.len() / channels;
        let kept = channels.min(self.channels);

        let mut published = 0;
        while published < frames {
            let take = (frames - published).min(self.max_frames);
            let Some(mut block) = self.acquire() else {
                break;
            };
            let chunk = &data[published * channels..(published + take) * channels];
            for (i, frame) in chunk.chunks_exact(channels).enumerate() {
                for (plane, &sample) in block.planes.iter_mut().zip(&frame[..kept]) {
                    plane[i] = sample;
                }
            }
            block.channels = kept;
            block.frames = take;
            self.submit(block);
            published += take;
        }
        published
    }

    fn acquire(&mut self) -> Option<AudioBlock> {
        match self.free.pop() {
            Ok(block) => Some(block),
            Err(_) => {
                self.overruns.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn submit(&mut self, block: AudioBlock) {
        if let Err(PushError::Full(_)) = self.filled.push(block) {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// UI side of the handoff.
pub struct BlockConsumer {
    filled: Consumer<AudioBlock>,
    free: Producer<AudioBlock>,
    overruns: Arc<AtomicU64>,
}

impl BlockConsumer {
    /// Blocks waiting to be drained.
    pub fn pending(&self) -> usize {
        self.filled.slots()
    }

    /// Hand every pending block to `f`, in order, and recycle it.
    pub fn drain<F: FnMut(&AudioBlock)>(&mut self, mut f: F) -> usize {
        let mut drained = 0;
        while let Ok(block) = self.filled.pop() {
            f(&block);
            let _ = self.free.push(block);
            drained += 1;
        }
        drained
    }

    /// Blocks dropped since the handoff was created.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Read and reset the overrun counter.
    pub fn take_overruns(&self) -> u64 {
        self.overruns.swap(0, Ordering::Relaxed)
    }

    /// Whether the producer was dropped (the stream is gone).
    pub fn is_abandoned(&self) -> bool {
        self.filled.is_abandoned()
    }
}

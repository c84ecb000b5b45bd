// Purpose - audio backends and connection supervision

pub mod cpal_backend;

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

pub use self::cpal_backend::CpalBackend;
use crate::{
    engine::ScopeEngine,
    error::BackendError,
    handoff::{self, BlockConsumer, BlockProducer},
    DEFAULT_SAMPLE_RATE, MAX_BLOCK_SIZE, MAX_CHANNELS,
};

/// Minimum time between two connection attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(5);
/// Descriptors in flight between the callback and the UI tick.
pub const HANDOFF_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct BackendInfo {
    pub device_name: String,
    pub sample_rate: f32,
    pub channels: usize,
}

/// A source of input audio that publishes into a handoff.
pub trait AudioBackend {
    /// Open the input and start publishing into `producer`.
    fn connect(&mut self, producer: BlockProducer) -> Result<BackendInfo, BackendError>;
    /// Whether the stream is still delivering audio.
    fn is_running(&self) -> bool;
    /// Stop the stream. Returns once no callback is in flight.
    fn disconnect(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Connected(BackendInfo),
    Disconnected,
}

/// Keeps a backend connected, retrying every [`RETRY_INTERVAL`].
///
/// Everything happens from `poll`, which the UI tick calls; nothing blocks.
pub struct BackendSupervisor<B: AudioBackend> {
    backend: B,
    consumer: Option<BlockConsumer>,
    info: Option<BackendInfo>,
    last_attempt: Option<Instant>,
    failures: u32,
    max_frames: usize,
    depth: usize,
}

impl<B: AudioBackend> BackendSupervisor<B> {
    pub fn new(backend: B) -> Self {
        Self::with_handoff(backend, MAX_BLOCK_SIZE, HANDOFF_DEPTH)
    }

    pub fn with_handoff(backend: B, max_frames: usize, depth: usize) -> Self {
        Self {
            backend,
            consumer: None,
            info: None,
            last_attempt: None,
            failures: 0,
            max_frames,
            depth,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn info(&self) -> Option<&BackendInfo> {
        self.info.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.info.is_some()
    }

    /// Rate of the connected backend, or the default while disconnected.
    pub fn sample_rate(&self) -> f32 {
        self.info
            .as_ref()
            .map_or(DEFAULT_SAMPLE_RATE, |info| info.sample_rate)
    }

    /// Check the connection and retry if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<BackendEvent> {
        if self.info.is_some() {
            let lost = !self.backend.is_running()
                || self.consumer.as_ref().map_or(true, BlockConsumer::is_abandoned);
            if !lost {
                return None;
            }
            warn!("audio backend stopped");
            self.teardown();
            return Some(BackendEvent::Disconnected);
        }

        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < RETRY_INTERVAL {
                return None;
            }
        }
        self.last_attempt = Some(now);

        let (producer, consumer) = handoff::channel(MAX_CHANNELS, self.max_frames, self.depth);
        match self.backend.connect(producer) {
            Ok(info) => {
                info!(
                    device = %info.device_name,
                    sample_rate = info.sample_rate,
                    channels = info.channels,
                    "audio backend connected"
                );
                self.failures = 0;
                self.consumer = Some(consumer);
                self.info = Some(info.clone());
                Some(BackendEvent::Connected(info))
            }
            Err(err) => {
                if self.failures == 0 {
                    warn!(error = %err, "audio backend unavailable, retrying every 5s");
                } else {
                    debug!(error = %err, attempt = self.failures + 1, "reconnect failed");
                }
                self.failures += 1;
                None
            }
        }
    }

    /// Ingest every pending block, then reduce the traces once. Returns the
    /// number of blocks drained.
    pub fn drain_into(&mut self, engine: &mut ScopeEngine) -> usize {
        let Some(consumer) = self.consumer.as_mut() else {
            return 0;
        };
        let drained = consumer.drain(|block| {
            block.ingest_into(engine);
        });
        let overruns = consumer.take_overruns();
        if overruns > 0 {
            warn!(overruns, "display fell behind, audio blocks dropped");
        }
        engine.refresh_if_dirty();
        drained
    }

    /// Stop the stream, then release the handoff.
    pub fn shutdown(&mut self) {
        if self.info.is_some() {
            info!("audio backend disconnected");
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.backend.disconnect();
        self.consumer = None;
        self.info = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;

    #[derive(Default)]
    struct MockBackend {
        available: bool,
        running: bool,
        attempts: usize,
        producer: Option<BlockProducer>,
    }

    impl AudioBackend for MockBackend {
        fn connect(&mut self, producer: BlockProducer) -> Result<BackendInfo, BackendError> {
            self.attempts += 1;
            if !self.available {
                return Err(BackendError::NoDevice);
            }
            self.running = true;
            self.producer = Some(producer);
            Ok(BackendInfo {
                device_name: "mock".into(),
                sample_rate: 44_100.0,
                channels: 1,
            })
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn disconnect(&mut self) {
            self.running = false;
            self.producer = None;
        }
    }

    #[test]
    fn retries_at_most_every_five_seconds() {
        let mut supervisor = BackendSupervisor::with_handoff(MockBackend::default(), 64, 4);
        let t0 = Instant::now();

        assert_eq!(supervisor.poll(t0), None);
        assert_eq!(supervisor.poll(t0 + Duration::from_secs(1)), None);
        assert_eq!(supervisor.poll(t0 + Duration::from_millis(4_999)), None);
        assert_eq!(supervisor.backend().attempts, 1);
        assert_eq!(supervisor.sample_rate(), DEFAULT_SAMPLE_RATE);

        supervisor.backend.available = true;
        let event = supervisor.poll(t0 + RETRY_INTERVAL);
        assert!(matches!(event, Some(BackendEvent::Connected(ref info)) if info.sample_rate == 44_100.0));
        assert_eq!(supervisor.backend().attempts, 2);
        assert_eq!(supervisor.sample_rate(), 44_100.0);
    }

    #[test]
    fn reports_lost_stream_and_waits_to_reconnect() {
        let mut backend = MockBackend::default();
        backend.available = true;
        let mut supervisor = BackendSupervisor::with_handoff(backend, 64, 4);
        let t0 = Instant::now();
        assert!(supervisor.poll(t0).is_some());
        assert_eq!(supervisor.poll(t0), None);

        supervisor.backend.running = false;
        assert_eq!(
            supervisor.poll(t0 + Duration::from_secs(1)),
            Some(BackendEvent::Disconnected)
        );
        assert!(!supervisor.is_connected());

        assert_eq!(supervisor.poll(t0 + Duration::from_secs(2)), None);
        assert_eq!(supervisor.backend().attempts, 1);
        assert!(supervisor.poll(t0 + Duration::from_secs(5)).is_some());
    }

    #[test]
    fn drains_published_blocks_into_engine() {
        let mut backend = MockBackend::default();
        backend.available = true;
        let mut supervisor = BackendSupervisor::with_handoff(backend, 64, 4);
        let mut engine = ScopeEngine::new(EngineConfig {
            channels: 1,
            trigger_enabled: false,
            ..EngineConfig::default()
        });
        assert_eq!(supervisor.drain_into(&mut engine), 0);

        supervisor.poll(Instant::now());
        let producer = supervisor.backend.producer.as_mut().unwrap();
        producer.publish_interleaved(&[0.25; 100], 1);

        assert_eq!(supervisor.drain_into(&mut engine), 2);
        assert_eq!(engine.capture().fill_index(), 100);

        supervisor.shutdown();
        assert!(supervisor.backend().producer.is_none());
        assert_eq!(supervisor.drain_into(&mut engine), 0);
    }

    #[test]
    fn one_reduction_pass_per_drain() {
        let mut backend = MockBackend::default();
        backend.available = true;
        let mut supervisor = BackendSupervisor::with_handoff(backend, 64, 8);
        let mut engine = ScopeEngine::new(EngineConfig {
            channels: 1,
            trigger_enabled: false,
            ..EngineConfig::default()
        });
        engine.set_pixel_width(100);
        supervisor.poll(Instant::now());
        let passes = engine.reducer().passes();

        let producer = supervisor.backend.producer.as_mut().unwrap();
        producer.publish_interleaved(&[0.25; 300], 1);
        assert_eq!(supervisor.drain_into(&mut engine), 5);
        assert_eq!(engine.reducer().passes(), passes + 1);
        assert!(!engine.is_dirty());

        // Nothing new, nothing to reduce.
        assert_eq!(supervisor.drain_into(&mut engine), 0);
        assert_eq!(engine.reducer().passes(), passes + 1);
    }
}

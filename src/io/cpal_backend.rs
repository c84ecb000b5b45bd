use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{AudioBackend, BackendInfo};
use crate::{error::BackendError, handoff::BlockProducer, MAX_CHANNELS};

/// Default input device of the default cpal host.
#[derive(Default)]
pub struct CpalBackend {
    stream: Option<cpal::Stream>,
    failed: Arc<AtomicBool>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for CpalBackend {
    fn connect(&mut self, mut producer: BlockProducer) -> Result<BackendInfo, BackendError> {
        self.disconnect();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(BackendError::NoDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_owned());

        let supported = device.default_input_config()?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(BackendError::UnsupportedFormat(format!(
                "{:?}",
                supported.sample_format()
            )));
        }
        let sample_rate = supported.sample_rate().0 as f32;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.into();

        let failed = Arc::new(AtomicBool::new(false));
        let error_flag = Arc::clone(&failed);

        // Runs on the realtime thread: copy into the handoff and nothing else.
        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                producer.publish_interleaved(data, channels);
            },
            move |_err| error_flag.store(true, Ordering::Release),
            None,
        )?;
        stream.play()?;

        self.failed = failed;
        self.stream = Some(stream);
        Ok(BackendInfo {
            device_name,
            sample_rate,
            channels: channels.min(MAX_CHANNELS),
        })
    }

    fn is_running(&self) -> bool {
        self.stream.is_some() && !self.failed.load(Ordering::Acquire)
    }

    fn disconnect(&mut self) {
        // Dropping the stream stops it and joins any running callback.
        self.stream = None;
    }
}

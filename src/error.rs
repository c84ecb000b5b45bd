use thiserror::Error;

/// Caller errors raised by engine queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("channel {channel} out of range (engine has {channels} channels)")]
    ChannelOutOfRange { channel: usize, channels: usize },
    #[error("pixel column {x} out of range (display is {width} columns wide)")]
    PixelOutOfRange { x: usize, width: usize },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown parameter '{section}.{name}'")]
    UnknownParameter { section: String, name: String },
    #[error("parameter '{name}' expects a {expected} value")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("home directory is not set; cannot locate settings file")]
    NoHomeDir,
}

/// Failures opening or running an audio backend. All of them are retried.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no default input device available")]
    NoDevice,
    #[error("unsupported sample format {0}, only f32 input is supported")]
    UnsupportedFormat(String),
    #[error("failed to fetch default input config")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build input stream")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start input stream")]
    Play(#[from] cpal::PlayStreamError),
}

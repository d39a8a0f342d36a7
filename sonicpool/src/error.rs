//! Error types for sonicpool
//!
//! Only engine construction and device-level operations report errors.
//! Per-sound operations use sentinels (`None`, `false`) instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Device granted no mixing channels")]
    NoChannels,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;

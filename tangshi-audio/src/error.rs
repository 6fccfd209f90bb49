//! Error types for tangshi-audio
//!
//! Module-specific error type using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for tangshi-audio
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed base64 speech payload
    #[error("Audio decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Non-positive sample rate or channel count, or inconsistent buffer shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Sample rate conversion errors
    #[error("Resample error: {0}")]
    Resample(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// WAV export errors
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Action lifecycle errors (busy, etc.)
    #[error(transparent)]
    Lifecycle(#[from] tangshi_common::Error),
}

/// Convenience Result type using tangshi-audio Error
pub type Result<T> = std::result::Result<T, Error>;

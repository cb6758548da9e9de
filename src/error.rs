use thiserror::Error;

use crate::noise::ChannelGroup;

/// Errors returned by the denoise entry points and the parameter adapters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenoiseError {
    /// Width or height is zero
    #[error("invalid mosaic dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Input buffer length doesn't match width * height
    #[error("input buffer: expected {expected} elements, got {got}")]
    InputSizeMismatch { expected: usize, got: usize },

    /// Output buffer length doesn't match width * height
    #[error("output buffer: expected {expected} elements, got {got}")]
    OutputSizeMismatch { expected: usize, got: usize },

    /// Threshold is not a finite value in [0, 1]
    #[error("noise threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),

    /// A band multiplier is not a finite value in [0, 1]
    #[error("band multiplier {value} for {group} band {band} is outside [0, 1]")]
    InvalidMultiplier { group: ChannelGroup, band: usize, value: f32 },

    /// Scratch buffers could not be reserved
    #[error("failed to allocate {bytes} bytes of scratch memory")]
    AllocationFailed { bytes: usize },

    /// Serialized parameter record could not be read or written
    #[error("parameter record: {0}")]
    Params(String),
}

impl From<serde_json::Error> for DenoiseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Params(err.to_string())
    }
}

/// Result alias for fallible denoise operations.
pub type Result<T> = std::result::Result<T, DenoiseError>;

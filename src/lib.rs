#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![doc = include_str!("../README.md")]

pub mod chain;
pub mod convolve;
pub mod distortion;
pub mod engine;
pub mod ring;
pub mod spectrum;
pub mod stereo;
pub mod utils;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use chain::*;
pub use convolve::*;
pub use distortion::*;
pub use engine::*;
pub use stereo::*;
pub use utils::*;

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Audio sample type (32-bit float).
pub type Sample = f32;

/// Buffer of audio samples.
pub type AudioBuffer = Vec<Sample>;

/// Samples per processing block.
pub const BLOCK_SIZE: usize = 128;

/// Length of the internal real transform.
pub const FFT_SIZE: usize = 512;

/// Impulse-response samples covered by one partition.
pub const SEGMENT_SIZE: usize = FFT_SIZE - BLOCK_SIZE;

/// Audio processing errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Not enough data provided for the requested operation.
    InsufficientData,
    /// Input buffer sizes do not match expected dimensions.
    BufferSizeMismatch,
    /// Only mono and interleaved stereo impulse responses are supported.
    UnsupportedChannelCount,
    /// Block and transform sizes do not form a valid partitioning.
    InvalidConfiguration,
    /// An error occurred during FFT processing.
    FftError,
}

impl core::fmt::Display for AudioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AudioError::InsufficientData => write!(f, "Insufficient data"),
            AudioError::BufferSizeMismatch => write!(f, "Buffer size mismatch"),
            AudioError::UnsupportedChannelCount => write!(f, "Unsupported channel count"),
            AudioError::InvalidConfiguration => write!(f, "Invalid engine configuration"),
            AudioError::FftError => write!(f, "FFT processing error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AudioError {}

/// Result type for audio processing operations
pub type AudioResult<T> = Result<T, AudioError>;

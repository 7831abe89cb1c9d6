//! Stereo convolution reverb with dry/wet mixing
//!
//! Two independent [`ConvolutionEngine`]s, one per channel. A mono impulse
//! response is shared by both; an interleaved stereo one is split so each
//! channel convolves with its own response.

use crate::{
    chain::StereoProcessor, engine::ConvolutionEngine, utils::deinterleave_stereo, AudioBuffer,
    AudioError, AudioResult, Sample, BLOCK_SIZE,
};

#[cfg(not(feature = "std"))]
use alloc::vec;

/// Default wet (reverb) gain.
pub const DEFAULT_WET_LEVEL: Sample = 0.3;

/// Default dry (direct) gain.
pub const DEFAULT_DRY_LEVEL: Sample = 0.7;

/// Stereo convolution reverb
///
/// Output per channel is `dry * dry_level + wet * wet_level`. The two gains
/// are independent and not normalized.
///
/// # Example
///
/// ```rust
/// use blockverb::StereoConvolutionReverb;
///
/// let mut reverb = StereoConvolutionReverb::new();
/// reverb.prepare(48000.0);
///
/// // Interleaved stereo IR: L, R, L, R
/// reverb.load_ir(&[1.0, 0.5, 0.0, 0.0], 2, 2).unwrap();
/// reverb.set_mix(1.0, 0.0);
///
/// let mut left = vec![1.0, 0.0, 0.0];
/// let mut right = vec![1.0, 0.0, 0.0];
/// reverb.process(&mut left, &mut right);
///
/// assert!((left[0] - 1.0).abs() < 1e-5);
/// assert!((right[0] - 0.5).abs() < 1e-5);
/// ```
pub struct StereoConvolutionReverb {
    left: ConvolutionEngine,
    right: ConvolutionEngine,
    dry_left: AudioBuffer,
    dry_right: AudioBuffer,
    wet_level: Sample,
    dry_level: Sample,
}

impl Default for StereoConvolutionReverb {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoConvolutionReverb {
    /// Create a reverb in pass-through mode with the default mix.
    pub fn new() -> Self {
        Self {
            left: ConvolutionEngine::new(),
            right: ConvolutionEngine::new(),
            dry_left: vec![0.0; BLOCK_SIZE],
            dry_right: vec![0.0; BLOCK_SIZE],
            wet_level: DEFAULT_WET_LEVEL,
            dry_level: DEFAULT_DRY_LEVEL,
        }
    }

    /// Prepare both engines and size the dry snapshot for one block.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.left.prepare(sample_rate);
        self.right.prepare(sample_rate);
        self.reserve_dry(BLOCK_SIZE);
    }

    /// Load an impulse response of `length_per_channel` frames.
    ///
    /// With `num_channels == 1` the same response is used for both
    /// channels; with `num_channels == 2` `data` is read as interleaved
    /// (L, R, L, R, ...). Both channels are validated and partitioned before
    /// either engine is touched, then committed together, so on error both
    /// keep their previous state.
    ///
    /// # Errors
    /// - `InsufficientData` if `length_per_channel` is 0
    /// - `UnsupportedChannelCount` unless `num_channels` is 1 or 2
    /// - `BufferSizeMismatch` if `data` is shorter than
    ///   `length_per_channel * num_channels`
    pub fn load_ir(
        &mut self,
        data: &[Sample],
        length_per_channel: usize,
        num_channels: usize,
    ) -> AudioResult<()> {
        if length_per_channel == 0 {
            return Err(AudioError::InsufficientData);
        }

        let (left, right) = match num_channels {
            1 => {
                let ir = data
                    .get(..length_per_channel)
                    .ok_or(AudioError::BufferSizeMismatch)?;
                (self.left.partition_ir(ir)?, self.right.partition_ir(ir)?)
            }
            2 => {
                let (ir_left, ir_right) = deinterleave_stereo(data, length_per_channel)?;
                (
                    self.left.partition_ir(&ir_left)?,
                    self.right.partition_ir(&ir_right)?,
                )
            }
            other => {
                log::warn!("rejecting impulse response with {} channels", other);
                return Err(AudioError::UnsupportedChannelCount);
            }
        };

        // Same default sizes on both sides
        self.left.install_ir(left)?;
        self.right.install_ir(right)
    }

    /// Convolve and mix `min(left.len(), right.len())` frames in place.
    pub fn process(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        let frames = left.len().min(right.len());
        let (left, right) = (&mut left[..frames], &mut right[..frames]);

        self.reserve_dry(frames);
        self.dry_left[..frames].copy_from_slice(left);
        self.dry_right[..frames].copy_from_slice(right);

        self.left.process_in_place(left);
        self.right.process_in_place(right);

        let (wet, dry) = (self.wet_level, self.dry_level);
        for (out, &d) in left.iter_mut().zip(&self.dry_left[..frames]) {
            *out = d * dry + *out * wet;
        }
        for (out, &d) in right.iter_mut().zip(&self.dry_right[..frames]) {
            *out = d * dry + *out * wet;
        }
    }

    /// Set the wet and dry gains.
    pub fn set_mix(&mut self, wet_level: Sample, dry_level: Sample) {
        self.wet_level = wet_level;
        self.dry_level = dry_level;
    }

    /// Current `(wet_level, dry_level)`.
    pub fn mix(&self) -> (Sample, Sample) {
        (self.wet_level, self.dry_level)
    }

    /// Clear both engines' streaming state, keeping their impulse responses.
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    /// Left channel engine.
    pub fn left_engine(&self) -> &ConvolutionEngine {
        &self.left
    }

    /// Right channel engine.
    pub fn right_engine(&self) -> &ConvolutionEngine {
        &self.right
    }

    fn reserve_dry(&mut self, frames: usize) {
        // Only grows; steady-state block sizes never reallocate
        if self.dry_left.len() < frames {
            self.dry_left.resize(frames, 0.0);
            self.dry_right.resize(frames, 0.0);
        }
    }
}

impl StereoProcessor for StereoConvolutionReverb {
    fn prepare(&mut self, sample_rate: f32) {
        StereoConvolutionReverb::prepare(self, sample_rate);
    }

    fn process(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        StereoConvolutionReverb::process(self, left, right);
    }

    fn reset(&mut self) {
        StereoConvolutionReverb::reset(self);
    }

    fn name(&self) -> &str {
        "convolution reverb"
    }
}

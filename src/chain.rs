//! Stereo processing stages and the fixed-order chain that runs them
//!
//! Every stage works in place on a pair of channel buffers. The reverb is
//! conventionally the last stage; tone-shaping stages such as
//! [`Distortion`](crate::distortion::Distortion) run before it.

use crate::Sample;

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

/// A block-processing stage operating on separate left/right buffers.
///
/// Implementations must not allocate or block in [`process`](Self::process)
/// once [`prepare`](Self::prepare) has run; it is called from the audio
/// thread.
pub trait StereoProcessor: Send {
    /// Prepare for playback at `sample_rate`, clearing any running state.
    fn prepare(&mut self, sample_rate: f32);

    /// Process `min(left.len(), right.len())` frames in place.
    fn process(&mut self, left: &mut [Sample], right: &mut [Sample]);

    /// Clear running state without touching settings.
    fn reset(&mut self);

    /// Short stage name for diagnostics.
    fn name(&self) -> &str;
}

/// Stages processed in insertion order.
///
/// # Example
///
/// ```rust
/// use blockverb::{Distortion, SignalChain, StereoConvolutionReverb};
///
/// let mut chain = SignalChain::new();
/// chain.push(Box::new(Distortion::new()));
/// chain.push(Box::new(StereoConvolutionReverb::new()));
/// chain.prepare(48000.0);
///
/// let mut left = vec![0.1; 256];
/// let mut right = vec![0.1; 256];
/// chain.process(&mut left, &mut right);
/// assert_eq!(chain.len(), 2);
/// ```
#[derive(Default)]
pub struct SignalChain {
    stages: Vec<Box<dyn StereoProcessor>>,
}

impl SignalChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage to the end of the chain.
    pub fn push(&mut self, stage: Box<dyn StereoProcessor>) {
        log::debug!("signal chain: appending stage '{}'", stage.name());
        self.stages.push(stage);
    }

    /// Prepare every stage.
    pub fn prepare(&mut self, sample_rate: f32) {
        for stage in &mut self.stages {
            stage.prepare(sample_rate);
        }
    }

    /// Run every stage in order over the same buffers.
    pub fn process(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        for stage in &mut self.stages {
            stage.process(left, right);
        }
    }

    /// Reset every stage.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in processing order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.name())
    }
}

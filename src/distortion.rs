//! Asymmetric tanh waveshaper

use crate::{chain::StereoProcessor, Sample};

#[cfg(not(feature = "std"))]
use libm::tanhf;

/// Default drive applied before the tanh curve.
pub const DEFAULT_DRIVE: Sample = 6.0;

/// Weight of the squared term that adds even harmonics.
const ASYMMETRY: Sample = 0.1;

/// Soft-clipping waveshaper: `y = tanh(drive * x) + 0.1 * x²`.
///
/// Stateless apart from its drive setting, so it is safe to run on any block
/// size.
#[derive(Debug, Clone)]
pub struct Distortion {
    drive: Sample,
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl Distortion {
    /// Create a waveshaper with [`DEFAULT_DRIVE`].
    pub fn new() -> Self {
        Self {
            drive: DEFAULT_DRIVE,
        }
    }

    /// Set the input gain into the tanh curve.
    pub fn set_drive(&mut self, drive: Sample) {
        self.drive = drive;
    }

    /// Current drive.
    pub fn drive(&self) -> Sample {
        self.drive
    }

    /// Shape one sample.
    #[inline]
    pub fn shape(&self, x: Sample) -> Sample {
        #[cfg(feature = "std")]
        let clipped = (x * self.drive).tanh();
        #[cfg(not(feature = "std"))]
        let clipped = tanhf(x * self.drive);

        clipped + ASYMMETRY * x * x
    }
}

impl StereoProcessor for Distortion {
    fn prepare(&mut self, _sample_rate: f32) {}

    fn process(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = self.shape(*l);
            *r = self.shape(*r);
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "distortion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[cfg(not(feature = "std"))]
    use alloc::vec;

    #[test]
    fn test_silence_stays_silent() {
        let dist = Distortion::new();
        assert_eq!(dist.shape(0.0), 0.0);
    }

    #[test]
    fn test_shape_curve() {
        let mut dist = Distortion::new();
        dist.set_drive(2.0);
        assert_eq!(dist.drive(), 2.0);

        assert_abs_diff_eq!(dist.shape(0.5), 1.0f32.tanh() + 0.025, epsilon = 1e-6);
        // The squared term is even, so the curve is asymmetric
        assert_abs_diff_eq!(dist.shape(-0.5), -(1.0f32.tanh()) + 0.025, epsilon = 1e-6);
    }

    #[test]
    fn test_high_drive_saturates() {
        let dist = Distortion::new();
        let y = dist.shape(1.0);
        assert!(y > 1.0 && y < 1.11);
    }

    #[test]
    fn test_process_both_channels() {
        let mut dist = Distortion::new();
        let mut left = vec![0.25, -0.25];
        let mut right = vec![0.5, 0.0];
        dist.process(&mut left, &mut right);

        assert_abs_diff_eq!(left[0], dist.shape(0.25), epsilon = 1e-7);
        assert_abs_diff_eq!(left[1], dist.shape(-0.25), epsilon = 1e-7);
        assert_abs_diff_eq!(right[0], dist.shape(0.5), epsilon = 1e-7);
        assert_eq!(right[1], 0.0);
        assert_eq!(dist.name(), "distortion");
    }
}

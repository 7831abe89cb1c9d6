//! Channel layout helpers

use crate::{AudioBuffer, AudioError, AudioResult, Sample};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Split interleaved stereo data (L, R, L, R, ...) into separate channels
///
/// Reads exactly `frames` frames.
///
/// # Errors
/// `BufferSizeMismatch` if `data` holds fewer than `2 * frames` samples.
///
/// # Example
///
/// ```rust
/// use blockverb::utils;
///
/// let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
/// let (left, right) = utils::deinterleave_stereo(&interleaved, 3).unwrap();
/// assert_eq!(left, vec![1.0, 3.0, 5.0]);
/// assert_eq!(right, vec![2.0, 4.0, 6.0]);
/// ```
pub fn deinterleave_stereo(
    data: &[Sample],
    frames: usize,
) -> AudioResult<(AudioBuffer, AudioBuffer)> {
    let needed = frames.checked_mul(2).ok_or(AudioError::BufferSizeMismatch)?;
    if data.len() < needed {
        return Err(AudioError::BufferSizeMismatch);
    }

    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for frame in data[..needed].chunks_exact(2) {
        left.push(frame[0]);
        right.push(frame[1]);
    }

    Ok((left, right))
}

/// Interleave two channels into (L, R, L, R, ...)
///
/// The shorter channel is zero-padded.
pub fn interleave_stereo(left: &[Sample], right: &[Sample]) -> AudioBuffer {
    let frames = left.len().max(right.len());
    let mut output = Vec::with_capacity(frames * 2);

    for i in 0..frames {
        output.push(left.get(i).copied().unwrap_or(0.0));
        output.push(right.get(i).copied().unwrap_or(0.0));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "std"))]
    use alloc::{vec, vec::Vec};

    #[test]
    fn test_deinterleave_reads_requested_frames() {
        let data = vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 9.0];
        let (left, right) = deinterleave_stereo(&data, 2).unwrap();
        assert_eq!(left, vec![1.0, 2.0]);
        assert_eq!(right, vec![-1.0, -2.0]);
    }

    #[test]
    fn test_deinterleave_short_data() {
        let data = vec![1.0, 2.0, 3.0];
        assert_eq!(
            deinterleave_stereo(&data, 2),
            Err(AudioError::BufferSizeMismatch)
        );
        assert_eq!(
            deinterleave_stereo(&data, usize::MAX),
            Err(AudioError::BufferSizeMismatch)
        );
    }

    #[test]
    fn test_interleave_pads_shorter_channel() {
        let output = interleave_stereo(&[1.0, 2.0, 3.0], &[4.0]);
        assert_eq!(output, vec![1.0, 4.0, 2.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_interleave_round_trip() {
        let left = vec![0.1, 0.2, 0.3];
        let right = vec![-0.1, -0.2, -0.3];
        let (l, r) = deinterleave_stereo(&interleave_stereo(&left, &right), 3).unwrap();
        assert_eq!(l, left);
        assert_eq!(r, right);
    }
}

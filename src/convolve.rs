//! Offline convolution helpers
//!
//! Whole-buffer counterparts to the streaming engine: a direct time-domain
//! reference and a renderer that flushes the engine's reverb tail.

use crate::{engine::ConvolutionEngine, AudioBuffer, AudioError, AudioResult, Sample};

#[cfg(not(feature = "std"))]
use alloc::vec;

/// Perform time-domain convolution
///
/// O(n·m) reference implementation. Output length is
/// `signal.len() + kernel.len() - 1`. Useful for validation and for very
/// short kernels; for streaming use [`ConvolutionEngine`].
///
/// # Example
///
/// ```rust
/// use blockverb::convolve;
///
/// let signal = vec![1.0, 2.0, 3.0, 4.0];
/// let kernel = vec![0.5, 0.3, 0.1];
/// let result = convolve::direct_convolve(&signal, &kernel).unwrap();
/// assert_eq!(result.len(), 6);
/// ```
pub fn direct_convolve(signal: &[Sample], kernel: &[Sample]) -> AudioResult<AudioBuffer> {
    if signal.is_empty() || kernel.is_empty() {
        return Err(AudioError::InsufficientData);
    }

    let output_length = signal.len() + kernel.len() - 1;
    let mut output = vec![0.0; output_length];

    for (i, &sig_sample) in signal.iter().enumerate() {
        for (j, &kernel_sample) in kernel.iter().enumerate() {
            output[i + j] += sig_sample * kernel_sample;
        }
    }

    Ok(output)
}

/// Stream `input` through `engine` and flush the reverb tail
///
/// Feeds `input` followed by `ir_len - 1` samples of silence, so the result
/// holds the full linear convolution (`input.len() + ir_len - 1` samples).
/// An engine without an impulse response returns `input` unchanged. The
/// engine is left holding the state after the tail; call
/// [`ConvolutionEngine::reset`] before reusing it on an unrelated stream.
///
/// # Example
///
/// ```rust
/// use blockverb::{convolve, ConvolutionEngine};
///
/// let mut engine = ConvolutionEngine::new();
/// engine.load_ir(&[1.0, 0.5, 0.25]).unwrap();
///
/// let wet = convolve::render_with_tail(&mut engine, &[1.0, 0.0]);
/// assert_eq!(wet.len(), 4);
/// assert!((wet[2] - 0.25).abs() < 1e-5);
/// ```
pub fn render_with_tail(engine: &mut ConvolutionEngine, input: &[Sample]) -> AudioBuffer {
    let tail = engine.ir_len().saturating_sub(1);
    let mut output = vec![0.0; input.len() + tail];
    output[..input.len()].copy_from_slice(input);

    engine.process_in_place(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[cfg(not(feature = "std"))]
    use alloc::vec;

    #[test]
    fn test_direct_convolution_basic() {
        let signal = vec![1.0, 2.0, 3.0, 4.0];
        let kernel = vec![0.5, 0.3, 0.1];

        let result = direct_convolve(&signal, &kernel).unwrap();
        let expected = vec![0.5, 1.3, 2.2, 3.1, 1.5, 0.4];

        assert_eq!(result.len(), expected.len());
        for (r, e) in result.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(r, e, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_direct_convolve_empty_inputs() {
        assert!(matches!(
            direct_convolve(&[], &[1.0]),
            Err(AudioError::InsufficientData)
        ));
        assert!(matches!(
            direct_convolve(&[1.0], &[]),
            Err(AudioError::InsufficientData)
        ));
    }

    #[test]
    fn test_render_with_tail_matches_direct() {
        let ir: Vec<f32> = (0..1000).map(|i| (-(i as f32) / 200.0).exp() * 0.5).collect();
        let input: Vec<f32> = (0..300).map(|i| ((i * 7) % 11) as f32 / 11.0 - 0.5).collect();

        let mut engine = ConvolutionEngine::new();
        engine.load_ir(&ir).unwrap();

        let rendered = render_with_tail(&mut engine, &input);
        let expected = direct_convolve(&input, &ir).unwrap();

        assert_eq!(rendered.len(), expected.len());
        for (r, e) in rendered.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(r, e, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_render_without_ir_is_identity() {
        let mut engine = ConvolutionEngine::new();
        let input = vec![0.1, -0.2, 0.3];
        assert_eq!(render_with_tail(&mut engine, &input), input);
    }
}

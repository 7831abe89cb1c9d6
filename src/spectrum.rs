//! Packed half-spectrum arithmetic and the real FFT wrapper
//!
//! A real signal of `N` samples has a conjugate-symmetric transform, so only
//! bins `0..=N/2` carry information. [`PackedSpectrum`] stores those bins as
//! `N + 1` reals:
//!
//! | range          | contents                                   |
//! |----------------|--------------------------------------------|
//! | `0..N/2`       | real parts of bins `0..N/2`                |
//! | `N/2..N`       | imaginary parts of bins `0..N/2` (bin 0 is always zero) |
//! | `N`            | real part of the Nyquist bin `N/2`         |
//!
//! Complex multiply-accumulate then runs on the two halves with plain real
//! arithmetic. [`RealFft`] converts between time-domain blocks and this
//! layout using `realfft`, keeping its own scratch so the hot path never
//! allocates.

use crate::{AudioBuffer, AudioError, AudioResult, Sample};
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

#[cfg(not(feature = "std"))]
use alloc::{sync::Arc, vec, vec::Vec};

#[cfg(feature = "std")]
use std::sync::Arc;

/// Frequency-domain block in packed half-spectrum layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedSpectrum {
    data: AudioBuffer,
    half: usize,
}

impl PackedSpectrum {
    /// Create a zeroed spectrum for a transform of `fft_size` real samples.
    ///
    /// `fft_size` must be even.
    pub fn new(fft_size: usize) -> Self {
        Self {
            data: vec![0.0; fft_size + 1],
            half: fft_size / 2,
        }
    }

    /// Length of the real transform this spectrum belongs to.
    pub fn fft_size(&self) -> usize {
        self.half * 2
    }

    /// Raw packed storage (`fft_size + 1` values).
    pub fn as_slice(&self) -> &[Sample] {
        &self.data
    }

    /// Real part of `bin` (valid for `0..=fft_size/2`).
    pub fn re(&self, bin: usize) -> Sample {
        if bin == self.half {
            self.data[2 * self.half]
        } else {
            self.data[bin]
        }
    }

    /// Imaginary part of `bin` (valid for `0..=fft_size/2`).
    ///
    /// The DC and Nyquist bins of a real signal are purely real.
    pub fn im(&self, bin: usize) -> Sample {
        if bin == 0 || bin == self.half {
            0.0
        } else {
            self.data[self.half + bin]
        }
    }

    /// Zero every bin.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Overwrite this spectrum with `other`.
    pub fn copy_from(&mut self, other: &PackedSpectrum) {
        self.data.copy_from_slice(&other.data);
    }

    /// Pack `fft_size/2 + 1` natural bins into this spectrum.
    pub fn pack(&mut self, bins: &[Complex<Sample>]) {
        let half = self.half;
        let (re, rest) = self.data.split_at_mut(half);
        let (im, nyquist) = rest.split_at_mut(half);

        for (i, bin) in bins[..half].iter().enumerate() {
            re[i] = bin.re;
            im[i] = bin.im;
        }
        im[0] = 0.0;
        nyquist[0] = bins[half].re;
    }

    /// Expand this spectrum into `fft_size/2 + 1` natural bins.
    pub fn unpack(&self, bins: &mut [Complex<Sample>]) {
        let half = self.half;
        let (re, rest) = self.data.split_at(half);
        let (im, nyquist) = rest.split_at(half);

        for (i, bin) in bins[..half].iter_mut().enumerate() {
            *bin = Complex::new(re[i], im[i]);
        }
        bins[0].im = 0.0;
        bins[half] = Complex::new(nyquist[0], 0.0);
    }

    /// Accumulate the complex product `a * b` into this spectrum.
    ///
    /// For `half = fft_size / 2`:
    ///
    /// ```text
    /// out[i]        += a[i] * b[i]        - a[half+i] * b[half+i]
    /// out[half+i]   += a[i] * b[half+i]   + a[half+i] * b[i]
    /// out[fft_size] += a[fft_size] * b[fft_size]
    /// ```
    pub fn multiply_accumulate(&mut self, a: &PackedSpectrum, b: &PackedSpectrum) {
        let half = self.half;
        debug_assert_eq!(a.half, half);
        debug_assert_eq!(b.half, half);

        let (a_re, a_rest) = a.data.split_at(half);
        let (a_im, a_nyquist) = a_rest.split_at(half);
        let (b_re, b_rest) = b.data.split_at(half);
        let (b_im, b_nyquist) = b_rest.split_at(half);
        let (out_re, out_rest) = self.data.split_at_mut(half);
        let (out_im, out_nyquist) = out_rest.split_at_mut(half);

        for ((((re, im), (&ar, &ai)), &br), &bi) in out_re
            .iter_mut()
            .zip(out_im.iter_mut())
            .zip(a_re.iter().zip(a_im))
            .zip(b_re)
            .zip(b_im)
        {
            *re += ar * br - ai * bi;
            *im += ar * bi + ai * br;
        }

        out_nyquist[0] += a_nyquist[0] * b_nyquist[0];
    }
}

/// Forward and inverse real FFT of one fixed size.
///
/// Wraps a pair of `realfft` plans together with the time, bin and scratch
/// buffers they need. After construction no method allocates.
pub struct RealFft {
    size: usize,
    r2c: Arc<dyn RealToComplex<Sample>>,
    c2r: Arc<dyn ComplexToReal<Sample>>,
    time: AudioBuffer,
    bins: Vec<Complex<Sample>>,
    forward_scratch: Vec<Complex<Sample>>,
    inverse_scratch: Vec<Complex<Sample>>,
}

impl RealFft {
    /// Plan transforms of `size` real samples.
    ///
    /// `size` must be even and non-zero.
    pub fn new(size: usize) -> Self {
        let mut planner = RealFftPlanner::<Sample>::new();
        let r2c = planner.plan_fft_forward(size);
        let c2r = planner.plan_fft_inverse(size);

        let forward_scratch = r2c.make_scratch_vec();
        let inverse_scratch = c2r.make_scratch_vec();

        Self {
            size,
            r2c,
            c2r,
            time: vec![0.0; size],
            bins: vec![Complex::new(0.0, 0.0); size / 2 + 1],
            forward_scratch,
            inverse_scratch,
        }
    }

    /// Transform length in real samples.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Zero-pad `input` to the transform size, transform it and pack the
    /// result into `output`.
    ///
    /// # Errors
    /// `BufferSizeMismatch` if `input` is longer than the transform or
    /// `output` belongs to a different size; `FftError` if `realfft` rejects
    /// the buffers.
    pub fn forward(&mut self, input: &[Sample], output: &mut PackedSpectrum) -> AudioResult<()> {
        if input.len() > self.size || output.fft_size() != self.size {
            return Err(AudioError::BufferSizeMismatch);
        }

        self.time[..input.len()].copy_from_slice(input);
        self.time[input.len()..].fill(0.0);

        self.r2c
            .process_with_scratch(&mut self.time, &mut self.bins, &mut self.forward_scratch)
            .map_err(|_| AudioError::FftError)?;

        output.pack(&self.bins);
        Ok(())
    }

    /// Inverse-transform a packed spectrum into `output`, normalized by
    /// `1 / size` so that `inverse(forward(x)) == x`.
    ///
    /// # Errors
    /// `BufferSizeMismatch` if `output` is not exactly one transform long or
    /// `input` belongs to a different size; `FftError` if `realfft` rejects
    /// the buffers.
    pub fn inverse(&mut self, input: &PackedSpectrum, output: &mut [Sample]) -> AudioResult<()> {
        if output.len() != self.size || input.fft_size() != self.size {
            return Err(AudioError::BufferSizeMismatch);
        }

        input.unpack(&mut self.bins);

        self.c2r
            .process_with_scratch(&mut self.bins, output, &mut self.inverse_scratch)
            .map_err(|_| AudioError::FftError)?;

        let scale = 1.0 / (self.size as Sample);
        for sample in output.iter_mut() {
            *sample *= scale;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[cfg(not(feature = "std"))]
    use alloc::vec;

    #[test]
    fn test_forward_inverse_identity() {
        let mut fft = RealFft::new(16);
        let input: Vec<f32> = (0..16).map(|i| (i as f32 * 0.37).sin()).collect();

        let mut spectrum = PackedSpectrum::new(16);
        fft.forward(&input, &mut spectrum).unwrap();

        let mut output = vec![0.0; 16];
        fft.inverse(&spectrum, &mut output).unwrap();

        for (o, i) in output.iter().zip(input.iter()) {
            assert_abs_diff_eq!(o, i, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_forward_zero_pads_short_input() {
        let mut fft = RealFft::new(8);
        let mut spectrum = PackedSpectrum::new(8);
        fft.forward(&[1.0], &mut spectrum).unwrap();

        // A unit impulse has a flat, purely real spectrum
        for bin in 0..=4 {
            assert_abs_diff_eq!(spectrum.re(bin), 1.0, epsilon = 1e-6);
            assert_abs_diff_eq!(spectrum.im(bin), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_forward_rejects_long_input() {
        let mut fft = RealFft::new(8);
        let mut spectrum = PackedSpectrum::new(8);
        let result = fft.forward(&[0.0; 9], &mut spectrum);
        assert_eq!(result, Err(AudioError::BufferSizeMismatch));
    }

    #[test]
    fn test_inverse_rejects_wrong_sizes() {
        let mut fft = RealFft::new(8);
        let spectrum = PackedSpectrum::new(8);
        let mut short = vec![0.0; 7];
        assert_eq!(
            fft.inverse(&spectrum, &mut short),
            Err(AudioError::BufferSizeMismatch)
        );

        let other = PackedSpectrum::new(16);
        let mut output = vec![0.0; 8];
        assert_eq!(
            fft.inverse(&other, &mut output),
            Err(AudioError::BufferSizeMismatch)
        );
    }

    #[test]
    fn test_pack_unpack_layout() {
        let bins = vec![
            Complex::new(1.0, 9.0), // DC imaginary part is dropped
            Complex::new(2.0, -1.0),
            Complex::new(3.0, 0.5),
            Complex::new(4.0, 2.0),
            Complex::new(5.0, 7.0), // Nyquist imaginary part is dropped
        ];
        let mut spectrum = PackedSpectrum::new(8);
        spectrum.pack(&bins);

        assert_eq!(
            spectrum.as_slice(),
            &[1.0, 2.0, 3.0, 4.0, 0.0, -1.0, 0.5, 2.0, 5.0]
        );

        let mut unpacked = vec![Complex::new(0.0, 0.0); 5];
        spectrum.unpack(&mut unpacked);
        assert_eq!(unpacked[0], Complex::new(1.0, 0.0));
        assert_eq!(unpacked[1], Complex::new(2.0, -1.0));
        assert_eq!(unpacked[3], Complex::new(4.0, 2.0));
        assert_eq!(unpacked[4], Complex::new(5.0, 0.0));
    }

    #[test]
    fn test_multiply_accumulate_matches_complex_product() {
        let a_bins = vec![
            Complex::new(0.5, 0.0),
            Complex::new(1.0, 2.0),
            Complex::new(-0.5, 0.25),
            Complex::new(3.0, -1.0),
            Complex::new(2.0, 0.0),
        ];
        let b_bins = vec![
            Complex::new(2.0, 0.0),
            Complex::new(0.5, -1.5),
            Complex::new(1.0, 1.0),
            Complex::new(-2.0, 0.5),
            Complex::new(-1.0, 0.0),
        ];

        let mut a = PackedSpectrum::new(8);
        let mut b = PackedSpectrum::new(8);
        a.pack(&a_bins);
        b.pack(&b_bins);

        let mut out = PackedSpectrum::new(8);
        out.multiply_accumulate(&a, &b);
        // Accumulating twice doubles every bin
        out.multiply_accumulate(&a, &b);

        for bin in 0..=4 {
            let expected = a_bins[bin] * b_bins[bin] * 2.0;
            assert_abs_diff_eq!(out.re(bin), expected.re, epsilon = 1e-6);
            assert_abs_diff_eq!(out.im(bin), expected.im, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_spectral_product_is_linear_convolution() {
        // Two short signals whose linear convolution fits in one transform
        let x = [1.0, 2.0, 3.0];
        let h = [0.5, -0.25, 0.125, 1.0];
        let mut fft = RealFft::new(8);

        let mut x_spec = PackedSpectrum::new(8);
        let mut h_spec = PackedSpectrum::new(8);
        fft.forward(&x, &mut x_spec).unwrap();
        fft.forward(&h, &mut h_spec).unwrap();

        let mut product = PackedSpectrum::new(8);
        product.multiply_accumulate(&x_spec, &h_spec);

        let mut output = vec![0.0; 8];
        fft.inverse(&product, &mut output).unwrap();

        let expected = [0.5, 0.75, 1.125, 0.5, 2.375, 3.0, 0.0, 0.0];
        for (o, e) in output.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(o, e, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_clear_and_copy() {
        let mut a = PackedSpectrum::new(4);
        a.pack(&[
            Complex::new(1.0, 0.0),
            Complex::new(2.0, 3.0),
            Complex::new(4.0, 0.0),
        ]);
        let mut b = PackedSpectrum::new(4);
        b.copy_from(&a);
        assert_eq!(a, b);

        b.clear();
        assert!(b.as_slice().iter().all(|&v| v == 0.0));
        assert_eq!(b.fft_size(), 4);
    }
}

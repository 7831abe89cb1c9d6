//! Streaming partitioned convolution for one audio channel
//!
//! The impulse response is cut into segments of `fft_size - block_size`
//! samples, each transformed once at load time. The input stream is
//! re-blocked into `block_size` chunks whose transforms are kept in a
//! [`HistoryRing`]. Partition `k` is applied to the block `k * ring_step`
//! blocks in the past, where `ring_step = segment_size / block_size`, and
//! the spill past `block_size` samples of every product is carried forward
//! with overlap-add.
//!
//! Contributions from partitions `1..` only depend on completed blocks, so
//! they are summed and inverse-transformed once when a block starts. While
//! the current block fills, its product with the first `block_size` taps is
//! evaluated directly in the time domain, one output sample at a time. Once
//! the block completes it is transformed, stored in the ring, and its spill
//! past the block is carried into the overlap. Every output sample depends
//! only on its position within the block, so the output has zero added
//! latency and is bit-identical whatever the caller's chunk size.

use crate::{
    ring::HistoryRing,
    spectrum::{PackedSpectrum, RealFft},
    AudioBuffer, AudioError, AudioResult, Sample, BLOCK_SIZE, FFT_SIZE,
};

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Block and transform sizes of a [`ConvolutionEngine`].
///
/// # Example
///
/// ```rust
/// use blockverb::{ConvolutionEngine, EngineConfig};
///
/// let config = EngineConfig {
///     block_size: 64,
///     fft_size: 256,
/// };
/// assert_eq!(config.segment_size(), 192);
/// assert_eq!(config.ring_step(), 3);
///
/// let engine = ConvolutionEngine::with_config(config).unwrap();
/// assert!(!engine.is_loaded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Samples per processing block (power of two)
    pub block_size: usize,
    /// Real transform length (power of two, at least `2 * block_size`)
    pub fft_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            fft_size: FFT_SIZE,
        }
    }
}

impl EngineConfig {
    /// Impulse-response samples per partition.
    pub fn segment_size(&self) -> usize {
        self.fft_size - self.block_size
    }

    /// History slots between consecutive partitions.
    pub fn ring_step(&self) -> usize {
        self.segment_size() / self.block_size
    }

    /// Check that the sizes form a valid partitioning.
    ///
    /// # Errors
    /// `InvalidConfiguration` unless both sizes are powers of two and
    /// `fft_size >= 2 * block_size`.
    pub fn validate(&self) -> AudioResult<()> {
        if !self.block_size.is_power_of_two()
            || !self.fft_size.is_power_of_two()
            || self.fft_size < self.block_size.saturating_mul(2)
        {
            return Err(AudioError::InvalidConfiguration);
        }
        Ok(())
    }
}

/// Where the input accumulator stands relative to a block boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// No samples of the current block have arrived yet; the next call
    /// segment starts a new block.
    AccumulatingNewBlock,
    /// The current block is partially filled.
    WithinBlock,
}

/// A loaded impulse response: its frequency-domain partitions, the leading
/// taps used for the in-block product, and the input history sized for them.
///
/// Built by [`ConvolutionEngine::partition_ir`] without touching the engine,
/// then committed with [`ConvolutionEngine::install_ir`].
#[derive(Debug, Clone)]
pub struct PartitionedIr {
    partitions: Vec<PackedSpectrum>,
    head: AudioBuffer,
    ring: HistoryRing,
    len: usize,
    block_size: usize,
    fft_size: usize,
}

impl PartitionedIr {
    /// Length of the impulse response in samples.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the impulse response is empty. Always false for a built one.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of frequency-domain partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

/// Uniformly partitioned convolution engine for a single channel.
///
/// Until an impulse response is loaded the engine passes audio through
/// unchanged.
///
/// # Example
///
/// ```rust
/// use blockverb::ConvolutionEngine;
///
/// let mut engine = ConvolutionEngine::new();
/// engine.prepare(48000.0);
/// engine.load_ir(&[0.5, 0.25]).unwrap();
///
/// // Any call size works; the engine re-blocks internally
/// let input = vec![1.0, 0.0, 0.0, 0.0, 0.0];
/// let mut output = vec![0.0; input.len()];
/// engine.process(&input, &mut output);
///
/// assert!((output[0] - 0.5).abs() < 1e-5);
/// assert!((output[1] - 0.25).abs() < 1e-5);
/// ```
pub struct ConvolutionEngine {
    config: EngineConfig,
    sample_rate: f32,
    fft: RealFft,
    ir: Option<PartitionedIr>,
    /// Time-domain samples of the current block, zero past `cursor`
    input: AudioBuffer,
    /// Inverse transform of the current block's output spectrum
    result: AudioBuffer,
    /// Spill of previous blocks into the current one
    overlap: AudioBuffer,
    /// Output spectrum of the completed block
    accumulator: PackedSpectrum,
    /// Sum of partitions `1..` against their history blocks
    older: PackedSpectrum,
    /// Inverse transform of `older`, fixed for the whole block
    older_result: AudioBuffer,
    cursor: usize,
    state: BlockState,
}

impl Default for ConvolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvolutionEngine {
    /// Create an empty engine with the default 128/512 sizes.
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// Create an empty engine with custom block and transform sizes.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `config` fails [`EngineConfig::validate`].
    pub fn with_config(config: EngineConfig) -> AudioResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let fft_size = config.fft_size;
        Self {
            config,
            sample_rate: 44100.0,
            fft: RealFft::new(fft_size),
            ir: None,
            input: vec![0.0; fft_size],
            result: vec![0.0; fft_size],
            overlap: vec![0.0; fft_size],
            accumulator: PackedSpectrum::new(fft_size),
            older: PackedSpectrum::new(fft_size),
            older_result: vec![0.0; fft_size],
            cursor: 0,
            state: BlockState::AccumulatingNewBlock,
        }
    }

    /// Store the sample rate and clear all streaming state.
    ///
    /// The algorithm does not depend on the sample rate.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.reset();
    }

    /// Replace the impulse response.
    ///
    /// The previous impulse response is discarded and streaming state is
    /// cleared. On error nothing changes: an engine in pass-through mode
    /// stays in it, and a previously loaded response stays active.
    ///
    /// # Errors
    /// `InsufficientData` if `ir` is empty; `FftError` if a partition could
    /// not be transformed.
    pub fn load_ir(&mut self, ir: &[Sample]) -> AudioResult<()> {
        let partitioned = self.partition_ir(ir)?;
        self.install_ir(partitioned)
    }

    /// Partition and transform `ir` for this engine's sizes without
    /// changing what the engine is currently running.
    ///
    /// # Errors
    /// `InsufficientData` if `ir` is empty; `FftError` if a partition could
    /// not be transformed.
    pub fn partition_ir(&mut self, ir: &[Sample]) -> AudioResult<PartitionedIr> {
        if ir.is_empty() {
            log::warn!("ignoring empty impulse response");
            return Err(AudioError::InsufficientData);
        }

        let block_size = self.config.block_size;
        let fft_size = self.config.fft_size;
        let segment_size = self.config.segment_size();
        let num_partitions = ir.len().div_ceil(segment_size);

        let mut partitions = Vec::with_capacity(num_partitions);
        for segment in ir.chunks(segment_size) {
            let mut spectrum = PackedSpectrum::new(fft_size);
            self.fft.forward(segment, &mut spectrum)?;
            partitions.push(spectrum);
        }

        Ok(PartitionedIr {
            partitions,
            head: ir[..ir.len().min(block_size)].to_vec(),
            ring: HistoryRing::new(self.config.ring_step() * num_partitions, fft_size),
            len: ir.len(),
            block_size,
            fft_size,
        })
    }

    /// Make `ir` the active impulse response and clear streaming state.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `ir` was partitioned by an engine with
    /// different block or transform sizes.
    pub fn install_ir(&mut self, ir: PartitionedIr) -> AudioResult<()> {
        if ir.block_size != self.config.block_size || ir.fft_size != self.config.fft_size {
            return Err(AudioError::InvalidConfiguration);
        }

        log::debug!(
            "loaded impulse response: {} samples, {} partitions, {} history slots",
            ir.len,
            ir.partitions.len(),
            ir.ring.capacity()
        );

        self.ir = Some(ir);
        self.reset();
        Ok(())
    }

    /// Convolve `input` into `output`.
    ///
    /// Processes `min(input.len(), output.len())` samples. Without an impulse
    /// response the samples are copied unchanged.
    pub fn process(&mut self, input: &[Sample], output: &mut [Sample]) {
        let len = input.len().min(output.len());
        output[..len].copy_from_slice(&input[..len]);
        self.process_in_place(&mut output[..len]);
    }

    /// Convolve `buffer` in place.
    pub fn process_in_place(&mut self, buffer: &mut [Sample]) {
        if let Err(err) = self.stream(buffer) {
            log::error!("convolution block failed: {}", err);
        }
    }

    fn stream(&mut self, buffer: &mut [Sample]) -> AudioResult<()> {
        let block_size = self.config.block_size;
        let ring_step = self.config.ring_step();
        let mut processed = 0;

        while processed < buffer.len() {
            let Some(ir) = self.ir.as_mut() else {
                return Ok(());
            };

            if self.state == BlockState::AccumulatingNewBlock {
                self.older.clear();
                for (k, partition) in ir.partitions.iter().enumerate().skip(1) {
                    self.older
                        .multiply_accumulate(ir.ring.at_lag(k * ring_step), partition);
                }
                if let Err(err) = self.fft.inverse(&self.older, &mut self.older_result) {
                    buffer[processed..].fill(0.0);
                    return Err(err);
                }
                self.state = BlockState::WithinBlock;
            }

            let count = (buffer.len() - processed).min(block_size - self.cursor);
            let cursor = self.cursor;

            for (i, sample) in buffer[processed..processed + count]
                .iter_mut()
                .enumerate()
            {
                let pos = cursor + i;
                self.input[pos] = *sample;

                // Current block against the leading taps, up to this sample
                let first = (pos + 1).saturating_sub(ir.head.len());
                let direct = self.input[first..=pos]
                    .iter()
                    .zip(ir.head[..=pos - first].iter().rev())
                    .fold(0.0, |acc, (x, h)| acc + x * h);

                *sample = self.older_result[pos] + self.overlap[pos] + direct;
            }

            self.cursor += count;
            processed += count;

            if self.cursor == block_size {
                if let Err(err) = self.finish_block() {
                    buffer[processed..].fill(0.0);
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Transform the completed block into the history and carry its spill
    /// past `block_size` samples into the overlap.
    fn finish_block(&mut self) -> AudioResult<()> {
        let Some(ir) = self.ir.as_mut() else {
            return Ok(());
        };
        let block_size = self.config.block_size;

        self.fft.forward(&self.input, ir.ring.current_mut())?;
        self.accumulator.copy_from(&self.older);
        self.accumulator
            .multiply_accumulate(ir.ring.current(), &ir.partitions[0]);
        self.fft.inverse(&self.accumulator, &mut self.result)?;

        // Shift the spill down by one block and add this block's
        let spill = self.config.segment_size();
        for i in 0..spill {
            self.overlap[i] = self.result[block_size + i] + self.overlap[block_size + i];
        }
        self.overlap[spill..].fill(0.0);

        self.input.fill(0.0);
        self.cursor = 0;
        ir.ring.retreat();
        self.state = BlockState::AccumulatingNewBlock;
        Ok(())
    }

    /// Clear all streaming state, keeping the loaded impulse response.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.state = BlockState::AccumulatingNewBlock;

        self.input.fill(0.0);
        self.result.fill(0.0);
        self.overlap.fill(0.0);
        self.accumulator.clear();
        self.older.clear();
        self.older_result.fill(0.0);

        if let Some(ir) = self.ir.as_mut() {
            ir.ring.clear();
        }
    }

    /// Whether an impulse response is loaded.
    pub fn is_loaded(&self) -> bool {
        self.ir.is_some()
    }

    /// Length of the loaded impulse response, 0 when none is loaded.
    pub fn ir_len(&self) -> usize {
        self.ir.as_ref().map_or(0, |ir| ir.len)
    }

    /// Number of frequency-domain partitions, 0 when no IR is loaded.
    pub fn partition_count(&self) -> usize {
        self.ir.as_ref().map_or(0, |ir| ir.partitions.len())
    }

    /// Number of history slots, 0 when no IR is loaded.
    pub fn ring_capacity(&self) -> usize {
        self.ir.as_ref().map_or(0, |ir| ir.ring.capacity())
    }

    /// Current block boundary state.
    pub fn block_state(&self) -> BlockState {
        self.state
    }

    /// Block and transform sizes.
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Sample rate passed to the last [`prepare`](Self::prepare).
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Processing latency in samples.
    ///
    /// The partially filled block is convolved directly as it fills, so output
    /// sample `n` is exactly sample `n` of the linear convolution.
    pub fn latency(&self) -> usize {
        0
    }
}

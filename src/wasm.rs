//! WASM bindings for browser integration
//!
//! Wraps the streaming reverb for an AudioWorklet: separate left/right
//! `Float32Array` blocks in, interleaved stereo out.

use crate::{
    chain::StereoProcessor, convolve, distortion::Distortion, stereo::StereoConvolutionReverb,
    utils, ConvolutionEngine,
};

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};

/// Streaming stereo convolution reverb for WASM
#[wasm_bindgen]
pub struct WasmConvolutionReverb {
    reverb: StereoConvolutionReverb,
    distortion: Option<Distortion>,
}

#[wasm_bindgen]
impl WasmConvolutionReverb {
    /// Create a reverb prepared for `sample_rate`, in pass-through mode
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f32) -> WasmConvolutionReverb {
        let mut reverb = StereoConvolutionReverb::new();
        reverb.prepare(sample_rate);
        WasmConvolutionReverb {
            reverb,
            distortion: None,
        }
    }

    /// Load a mono or interleaved stereo impulse response
    #[wasm_bindgen]
    pub fn load_ir(&mut self, data: &Float32Array, num_channels: usize) -> Result<(), JsValue> {
        let data_vec: Vec<f32> = data.to_vec();
        let frames = if num_channels == 0 {
            0
        } else {
            data_vec.len() / num_channels
        };

        self.reverb
            .load_ir(&data_vec, frames, num_channels)
            .map_err(|e| JsValue::from_str(&format!("Impulse response error: {:?}", e)))
    }

    /// Process one stereo block
    /// Returns interleaved output (L, R, L, R, ...)
    #[wasm_bindgen]
    pub fn process(&mut self, input_left: &Float32Array, input_right: &Float32Array) -> Float32Array {
        let mut left: Vec<f32> = input_left.to_vec();
        let mut right: Vec<f32> = input_right.to_vec();

        let frames = left.len().min(right.len());
        left.truncate(frames);
        right.truncate(frames);

        if let Some(distortion) = self.distortion.as_mut() {
            distortion.process(&mut left, &mut right);
        }
        self.reverb.process(&mut left, &mut right);

        let output = utils::interleave_stereo(&left, &right);
        Float32Array::from(&output[..])
    }

    /// Set wet and dry gains
    #[wasm_bindgen]
    pub fn set_mix(&mut self, wet_level: f32, dry_level: f32) {
        self.reverb.set_mix(wet_level, dry_level);
    }

    /// Enable the pre-reverb waveshaper at `drive`, or disable it with `0`
    #[wasm_bindgen]
    pub fn set_distortion(&mut self, drive: f32) {
        self.distortion = if drive > 0.0 {
            let mut distortion = Distortion::new();
            distortion.set_drive(drive);
            Some(distortion)
        } else {
            None
        };
    }

    /// Clear the reverb tail
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.reverb.reset();
    }
}

/// Convolve a whole mono buffer, including the reverb tail (non-real-time)
#[wasm_bindgen]
pub fn convolve_audio(
    audio: &Float32Array,
    impulse_response: &Float32Array,
) -> Result<Float32Array, JsValue> {
    let audio_vec: Vec<f32> = audio.to_vec();
    let ir_vec: Vec<f32> = impulse_response.to_vec();

    let mut engine = ConvolutionEngine::new();
    engine
        .load_ir(&ir_vec)
        .map_err(|e| JsValue::from_str(&format!("Convolution error: {:?}", e)))?;

    let result = convolve::render_with_tail(&mut engine, &audio_vec);
    Ok(Float32Array::from(&result[..]))
}

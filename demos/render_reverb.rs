//! # Render Reverb
//!
//! Streams a WAV file through the stereo convolution reverb in 128-sample
//! blocks and writes the result, including the reverb tail.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example render_reverb -- <input.wav> <impulse_response.wav> [output.wav] [wet] [dry]
//! ```
//!
//! ## Example
//!
//! ```bash
//! cargo run --example render_reverb -- guitar.wav hall_ir.wav guitar_hall.wav 0.4 0.6
//! ```

use anyhow::{Context, Result};
use blockverb::{utils, StereoConvolutionReverb, BLOCK_SIZE};
use hound::{WavReader, WavSpec, WavWriter};
use std::env;

/// Read WAV samples as f32 in [-1, 1]
fn read_wav_samples(reader: &mut WavReader<std::io::BufReader<std::fs::File>>) -> Result<Vec<f32>> {
    let spec = reader.spec();

    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => Ok(reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read 16-bit samples")?
            .into_iter()
            .map(|s| s as f32 / 32768.0)
            .collect()),
        (hound::SampleFormat::Int, bits @ (24 | 32)) => {
            let scale = (1u32 << (bits - 1)) as f32;
            Ok(reader
                .samples::<i32>()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to read {}-bit samples", bits))?
                .into_iter()
                .map(|s| s as f32 / scale)
                .collect())
        }
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read 32-bit float samples"),
        _ => anyhow::bail!(
            "Unsupported audio format: {} bits, {:?}",
            spec.bits_per_sample,
            spec.sample_format
        ),
    }
}

fn parse_level(arg: Option<&String>, default: f32) -> Result<f32> {
    match arg {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid mix level '{}'", value)),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} <input.wav> <impulse_response.wav> [output.wav] [wet] [dry]",
            args[0]
        );
        std::process::exit(1);
    }

    let audio_path = &args[1];
    let ir_path = &args[2];
    let output_path = args.get(3).map(String::as_str).unwrap_or("output_reverb.wav");
    let wet = parse_level(args.get(4), 0.3)?;
    let dry = parse_level(args.get(5), 0.7)?;

    let mut audio_reader =
        WavReader::open(audio_path).with_context(|| format!("Failed to open {}", audio_path))?;
    let audio_spec = audio_reader.spec();
    let audio_samples = read_wav_samples(&mut audio_reader)?;

    let mut ir_reader =
        WavReader::open(ir_path).with_context(|| format!("Failed to open {}", ir_path))?;
    let ir_spec = ir_reader.spec();
    let ir_samples = read_wav_samples(&mut ir_reader)?;

    if audio_spec.sample_rate != ir_spec.sample_rate {
        anyhow::bail!(
            "Sample rate mismatch: audio is {} Hz but IR is {} Hz",
            audio_spec.sample_rate,
            ir_spec.sample_rate
        );
    }

    let ir_channels = ir_spec.channels as usize;
    let ir_frames = ir_samples.len() / ir_channels.max(1);

    let mut reverb = StereoConvolutionReverb::new();
    reverb.prepare(audio_spec.sample_rate as f32);
    reverb
        .load_ir(&ir_samples, ir_frames, ir_channels)
        .with_context(|| format!("Failed to load {}", ir_path))?;
    reverb.set_mix(wet, dry);

    let (mut left, mut right) = match audio_spec.channels {
        1 => (audio_samples.clone(), audio_samples),
        2 => utils::deinterleave_stereo(&audio_samples, audio_samples.len() / 2)?,
        n => anyhow::bail!("Unsupported input channel count: {}", n),
    };

    // Silence so the tail rings out
    let total = left.len() + ir_frames.saturating_sub(1);
    left.resize(total, 0.0);
    right.resize(total, 0.0);

    println!(
        "Rendering {} frames at {} Hz (IR: {} frames, {} channel(s), wet {:.2}, dry {:.2})",
        total, audio_spec.sample_rate, ir_frames, ir_channels, wet, dry
    );

    for (l, r) in left
        .chunks_mut(BLOCK_SIZE)
        .zip(right.chunks_mut(BLOCK_SIZE))
    {
        reverb.process(l, r);
    }

    let peak = left
        .iter()
        .chain(&right)
        .fold(0.0f32, |peak, s| peak.max(s.abs()));
    let gain = if peak > 1.0 {
        println!("Normalizing output (peak was {:.2})", peak);
        1.0 / peak
    } else {
        1.0
    };

    let output_spec = WavSpec {
        channels: 2,
        sample_rate: audio_spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(output_path, output_spec)
        .with_context(|| format!("Failed to create {}", output_path))?;

    for sample in utils::interleave_stereo(&left, &right) {
        let sample_i16 = ((sample * gain).clamp(-1.0, 1.0) * 32767.0) as i16;
        writer.write_sample(sample_i16)?;
    }

    writer.finalize()?;
    println!("Saved: {}", output_path);

    Ok(())
}

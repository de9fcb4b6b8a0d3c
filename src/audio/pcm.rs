//! PCM helpers shared by the in-process mixing strategies.
//!
//! Samples are mono `f32` in `[-1.0, 1.0]` unless noted.

use super::interface::{MixError, MUSIC_GAIN, SPEECH_GAIN};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;

const RESAMPLE_CHUNK: usize = 1024;
const RESAMPLE_SUB_CHUNKS: usize = 2;

/// Read a WAV file as mono floats, averaging channels.
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), MixError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1) as u32)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok((downmix(&interleaved, channels), spec.sample_rate))
}

pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample mono PCM from `from` Hz to `to` Hz.
///
/// The output is aligned (resampler delay removed) and exactly
/// `round(len * to / from)` samples long.
pub fn resample(input: &[f32], from: u32, to: u32) -> Result<Vec<f32>, MixError> {
    if from == to || input.is_empty() {
        return Ok(input.to_vec());
    }
    if from == 0 || to == 0 {
        return Err(MixError::Resample(format!("invalid rate {} -> {}", from, to)));
    }

    let mut resampler = FftFixedIn::<f32>::new(
        from as usize,
        to as usize,
        RESAMPLE_CHUNK,
        RESAMPLE_SUB_CHUNKS,
        1,
    )
    .map_err(|e| MixError::Resample(e.to_string()))?;

    let expected = (input.len() as f64 * to as f64 / from as f64).round() as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);

    // Final partial chunk is zero-padded; extra silent chunks flush the delay line.
    let mut pos = 0;
    while pos < input.len() || out.len() < expected + delay {
        let mut chunk = vec![0.0f32; RESAMPLE_CHUNK];
        if pos < input.len() {
            let end = (pos + RESAMPLE_CHUNK).min(input.len());
            chunk[..end - pos].copy_from_slice(&input[pos..end]);
            pos = end;
        }
        let block = vec![chunk];
        let frames = resampler
            .process(&block, None)
            .map_err(|e| MixError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}

/// Loop `music` until it covers `len` samples, then trim. Empty music → silence.
pub fn fit_length(music: &[f32], len: usize) -> Vec<f32> {
    if music.is_empty() {
        return vec![0.0; len];
    }
    music.iter().copied().cycle().take(len).collect()
}

/// Trim or zero-pad `music` to `len` samples.
pub fn pad_or_trim(music: &[f32], len: usize) -> Vec<f32> {
    let mut out: Vec<f32> = music.iter().copied().take(len).collect();
    out.resize(len, 0.0);
    out
}

/// `SPEECH_GAIN * speech + MUSIC_GAIN * music`, sample by sample.
pub fn weighted_mix(speech: &[f32], music: &[f32]) -> Result<Vec<f32>, MixError> {
    if speech.len() != music.len() {
        return Err(MixError::LengthMismatch {
            speech: speech.len(),
            music: music.len(),
        });
    }
    Ok(speech
        .iter()
        .zip(music)
        .map(|(s, m)| SPEECH_GAIN * s + MUSIC_GAIN * m)
        .collect())
}

/// Divide by the peak amplitude when it exceeds 1.0.
pub fn peak_normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |p, s| p.max(s.abs()));
    if peak > 1.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

pub fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Write mono 16-bit PCM WAV, creating parent directories.
pub fn write_wav_i16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), MixError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(to_i16(s))?;
    }
    writer.finalize()?;
    Ok(())
}

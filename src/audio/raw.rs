//! Last-resort mix over raw 16-bit frames. No resampling, no normalization.

use super::interface::{run_blocking, wav_target, MixError, MixStrategy, MUSIC_GAIN, SPEECH_GAIN};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct RawMixer;

fn read_i16(path: &Path) -> Result<(Vec<i16>, hound::WavSpec), MixError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(MixError::Unsupported(format!(
            "{}: expected 16-bit PCM, got {} bits",
            path.display(),
            spec.bits_per_sample
        )));
    }
    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    Ok((samples, spec))
}

/// Samples are mixed index by index; the speech file's format is reused.
pub fn mix_raw(speech: &Path, music: &Path, output: &Path) -> Result<PathBuf, MixError> {
    let (speech, spec) = read_i16(speech)?;
    let (music, music_spec) = read_i16(music)?;
    if music_spec.channels != spec.channels {
        return Err(MixError::Unsupported(format!(
            "channel count differs: speech {}, music {}",
            spec.channels, music_spec.channels
        )));
    }
    if music_spec.sample_rate != spec.sample_rate {
        tracing::debug!(
            "[Mixer] Raw mix ignores rate mismatch ({} vs {} Hz)",
            spec.sample_rate,
            music_spec.sample_rate
        );
    }

    let target = wav_target(output);
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = hound::WavWriter::create(&target, spec)?;
    for (i, &s) in speech.iter().enumerate() {
        let m = music.get(i).copied().unwrap_or(0);
        let mixed = SPEECH_GAIN * s as f32 + MUSIC_GAIN * m as f32;
        writer.write_sample(mixed.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(target)
}

#[async_trait]
impl MixStrategy for RawMixer {
    fn name(&self) -> &'static str {
        "raw"
    }

    async fn mix(&self, speech: &Path, music: &Path, output: &Path) -> Result<PathBuf, MixError> {
        let (speech, music, output) = (
            speech.to_path_buf(),
            music.to_path_buf(),
            output.to_path_buf(),
        );
        run_blocking(move || mix_raw(&speech, &music, &output)).await
    }
}

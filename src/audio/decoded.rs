//! Full-quality path: decode any container, align music to speech, encode by
//! output extension.

use super::decode::decode_mono;
use super::ffmpeg::encode_pcm;
use super::interface::{run_blocking, wav_target, MixError, MixStrategy};
use super::pcm::{fit_length, peak_normalize, resample, weighted_mix, write_wav_i16};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct DecodedMixer {
    encoder: String,
}

impl DecodedMixer {
    /// `encoder` is the ffmpeg binary used for non-WAV outputs.
    pub fn new(encoder: impl Into<String>) -> Self {
        Self {
            encoder: encoder.into(),
        }
    }
}

/// Decode both inputs and mix at the speech rate. Output length equals the speech length.
pub fn mix_decoded(speech: &Path, music: &Path) -> Result<(Vec<f32>, u32), MixError> {
    let (speech, rate) = decode_mono(speech)?;
    let (music, music_rate) = decode_mono(music)?;
    if speech.is_empty() {
        return Err(MixError::Decode("speech has no samples".to_string()));
    }

    let music = resample(&music, music_rate, rate)?;
    let music = fit_length(&music, speech.len());
    if music.len() != speech.len() {
        return Err(MixError::LengthMismatch {
            speech: speech.len(),
            music: music.len(),
        });
    }

    let mut mixed = weighted_mix(&speech, &music)?;
    peak_normalize(&mut mixed);
    Ok((mixed, rate))
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

#[async_trait]
impl MixStrategy for DecodedMixer {
    fn name(&self) -> &'static str {
        "decoded"
    }

    async fn mix(&self, speech: &Path, music: &Path, output: &Path) -> Result<PathBuf, MixError> {
        let (speech_path, music_path) = (speech.to_path_buf(), music.to_path_buf());
        let (mixed, rate) = run_blocking(move || mix_decoded(&speech_path, &music_path)).await?;

        if !is_wav(output) {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            match encode_pcm(&self.encoder, &mixed, rate, output).await {
                Ok(()) => return Ok(output.to_path_buf()),
                Err(e) => tracing::warn!(
                    "[Mixer] Direct encode to {} failed ({}), writing WAV instead",
                    output.display(),
                    e
                ),
            }
        }

        let target = wav_target(output);
        let path = target.clone();
        run_blocking(move || write_wav_i16(&path, &mixed, rate)).await?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pcm::{fixtures, read_wav_mono};
    use tempfile::TempDir;

    #[tokio::test]
    async fn loops_short_music_to_speech_length() {
        let tmp = TempDir::new().unwrap();
        let speech = tmp.path().join("speech.wav");
        let music = tmp.path().join("music.wav");
        let output = tmp.path().join("mixed.wav");
        fixtures::constant_wav(&speech, 0.5, 16_000, 4_000);
        fixtures::constant_wav(&music, 0.5, 16_000, 1_000);

        let written = DecodedMixer::new("ffmpeg")
            .mix(&speech, &music, &output)
            .await
            .unwrap();
        assert_eq!(written, output);
        let (samples, rate) = read_wav_mono(&written).unwrap();
        assert_eq!(rate, 16_000);
        assert_eq!(samples.len(), 4_000);
        // 0.8 * 0.5 + 0.2 * 0.5 everywhere, music looped
        assert!(samples.iter().all(|s| (s - 0.5).abs() < 1e-3));
    }

    #[tokio::test]
    async fn resamples_music_and_trims_to_speech() {
        let tmp = TempDir::new().unwrap();
        let speech = tmp.path().join("speech.wav");
        let music = tmp.path().join("music.wav");
        fixtures::constant_wav(&speech, 0.25, 22_050, 2_205);
        fixtures::sine_wav(&music, 220.0, 44_100, 44_100);

        let (mixed, rate) = mix_decoded(&speech, &music).unwrap();
        assert_eq!(rate, 22_050);
        assert_eq!(mixed.len(), 2_205);
    }

    #[tokio::test]
    async fn missing_encoder_falls_back_to_wav() {
        let tmp = TempDir::new().unwrap();
        let speech = tmp.path().join("speech.wav");
        let music = tmp.path().join("music.wav");
        fixtures::constant_wav(&speech, 0.1, 8_000, 800);
        fixtures::constant_wav(&music, 0.1, 8_000, 800);

        let written = DecodedMixer::new("/nonexistent/ffmpeg-binary")
            .mix(&speech, &music, &tmp.path().join("ad.mp3"))
            .await
            .unwrap();
        assert_eq!(written, tmp.path().join("ad.wav"));
        assert_eq!(read_wav_mono(&written).unwrap().0.len(), 800);
    }
}

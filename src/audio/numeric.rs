//! WAV-only float mix with resampling.

use super::interface::{run_blocking, wav_target, MixError, MixStrategy};
use super::pcm::{pad_or_trim, peak_normalize, read_wav_mono, resample, weighted_mix, write_wav_i16};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct NumericMixer;

/// Music is trimmed (or padded with silence) to the speech length; speech is never cut.
pub fn mix_numeric(speech: &Path, music: &Path, output: &Path) -> Result<PathBuf, MixError> {
    let (speech, rate) = read_wav_mono(speech)?;
    let (music, music_rate) = read_wav_mono(music)?;

    let music = if music_rate != rate {
        tracing::debug!("[Mixer] Resampling music {} Hz -> {} Hz", music_rate, rate);
        resample(&music, music_rate, rate)?
    } else {
        music
    };
    let music = pad_or_trim(&music, speech.len());

    let mut mixed = weighted_mix(&speech, &music)?;
    peak_normalize(&mut mixed);

    let target = wav_target(output);
    write_wav_i16(&target, &mixed, rate)?;
    Ok(target)
}

#[async_trait]
impl MixStrategy for NumericMixer {
    fn name(&self) -> &'static str {
        "numeric"
    }

    async fn mix(&self, speech: &Path, music: &Path, output: &Path) -> Result<PathBuf, MixError> {
        let (speech, music, output) = (
            speech.to_path_buf(),
            music.to_path_buf(),
            output.to_path_buf(),
        );
        run_blocking(move || mix_numeric(&speech, &music, &output)).await
    }
}

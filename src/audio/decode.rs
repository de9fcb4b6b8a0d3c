//! Container-agnostic decode to mono PCM via symphonia.

use super::interface::MixError;
use super::pcm::downmix;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode the first audio track of `path` at its native rate, averaged to mono.
pub fn decode_mono(path: &Path) -> Result<(Vec<f32>, u32), MixError> {
    let src = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let detected = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| MixError::Decode(format!("{}: {}", path.display(), e)))?;
    let mut format = detected.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| MixError::Decode(format!("{}: no audio track", path.display())))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| MixError::Decode(format!("unsupported codec: {}", e)))?;

    let mut mono = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(MixError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // corrupt frame, skip it
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("[Mixer] Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(MixError::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        mono.extend(downmix(buf.samples(), spec.channels.count()));
    }

    if sample_rate == 0 {
        return Err(MixError::Decode(format!(
            "{}: unknown sample rate",
            path.display()
        )));
    }
    Ok((mono, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::pcm::fixtures;
    use tempfile::TempDir;

    #[test]
    fn decodes_wav_fixture() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tone.wav");
        fixtures::sine_wav(&path, 440.0, 22_050, 2_205);
        let (samples, rate) = decode_mono(&path).unwrap();
        assert_eq!(rate, 22_050);
        assert_eq!(samples.len(), 2_205);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("noise.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(matches!(decode_mono(&path), Err(MixError::Decode(_))));
    }
}

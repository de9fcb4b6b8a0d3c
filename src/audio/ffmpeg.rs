//! Mixing and encoding through an external ffmpeg binary.

use super::interface::{MixError, MixStrategy, MUSIC_GAIN, SPEECH_GAIN};
use super::pcm::to_i16;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// `[0]` is speech, `[1]` is music; output lasts as long as the speech.
pub fn mix_filter() -> String {
    format!(
        "[0]volume={}[speech];[1]volume={}[music];[speech][music]amix=inputs=2:duration=first",
        SPEECH_GAIN, MUSIC_GAIN
    )
}

pub struct FfmpegMixer {
    binary: String,
}

impl FfmpegMixer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check the binary runs at all.
    pub async fn ensure_available(&self) -> Result<(), MixError> {
        let status = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| MixError::ToolUnavailable(format!("{}: {}", self.binary, e)))?;
        if !status.success() {
            return Err(MixError::ToolUnavailable(format!(
                "{} -version exited with {}",
                self.binary, status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MixStrategy for FfmpegMixer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn mix(&self, speech: &Path, music: &Path, output: &Path) -> Result<PathBuf, MixError> {
        self.ensure_available().await?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let result = Command::new(&self.binary)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(speech)
            .arg("-i")
            .arg(music)
            .arg("-filter_complex")
            .arg(mix_filter())
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MixError::ToolUnavailable(format!("{}: {}", self.binary, e)))?;

        if !result.status.success() {
            return Err(MixError::ToolFailed(
                String::from_utf8_lossy(&result.stderr).trim().to_string(),
            ));
        }
        Ok(output.to_path_buf())
    }
}

/// Encode mono float PCM to `output` (container chosen by extension) by
/// piping 16-bit little-endian samples into ffmpeg.
pub async fn encode_pcm(
    binary: &str,
    samples: &[f32],
    sample_rate: u32,
    output: &Path,
) -> Result<(), MixError> {
    let mut child = Command::new(binary)
        .args(["-y", "-loglevel", "error", "-f", "s16le", "-ar"])
        .arg(sample_rate.to_string())
        .args(["-ac", "1", "-i", "pipe:0"])
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| MixError::ToolUnavailable(format!("{}: {}", binary, e)))?;

    let (mut stdin, mut stderr) = match (child.stdin.take(), child.stderr.take()) {
        (Some(stdin), Some(stderr)) => (stdin, stderr),
        _ => return Err(MixError::ToolFailed("encoder pipes unavailable".to_string())),
    };

    // stderr is read on its own task while stdin is written
    let drain = tokio::spawn(async move {
        let mut captured = Vec::new();
        stderr.read_to_end(&mut captured).await.map(|_| captured)
    });

    let bytes: Vec<u8> = samples
        .iter()
        .flat_map(|&s| to_i16(s).to_le_bytes())
        .collect();
    let written = async {
        stdin.write_all(&bytes).await?;
        stdin.shutdown().await
    }
    .await;
    drop(stdin);

    let status = child.wait().await?;
    let captured = drain
        .await
        .map_err(|e| MixError::ToolFailed(format!("stderr reader: {}", e)))??;
    if !status.success() {
        return Err(MixError::ToolFailed(
            String::from_utf8_lossy(&captured).trim().to_string(),
        ));
    }
    written?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn filter_weights_speech_over_music() {
        assert_eq!(
            mix_filter(),
            "[0]volume=0.8[speech];[1]volume=0.2[music];[speech][music]amix=inputs=2:duration=first"
        );
    }

    #[tokio::test]
    async fn missing_binary_is_tool_unavailable() {
        let tmp = TempDir::new().unwrap();
        let mixer = FfmpegMixer::new("/nonexistent/ffmpeg-binary");
        let err = mixer
            .mix(
                &tmp.path().join("speech.mp3"),
                &tmp.path().join("music.mp3"),
                &tmp.path().join("out.mp3"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MixError::ToolUnavailable(_)));
    }

    #[tokio::test]
    async fn encode_without_binary_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("o.mp3");
        let err = encode_pcm("/nonexistent/ffmpeg-binary", &[0.0; 16], 8_000, &output)
            .await
            .unwrap_err();
        assert!(matches!(err, MixError::ToolUnavailable(_)));
    }

    #[cfg(unix)]
    fn fake_encoder(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn noisy_encoder_does_not_stall() {
        let tmp = TempDir::new().unwrap();
        // fills the stderr pipe before reading any of stdin
        let binary = fake_encoder(
            tmp.path(),
            "head -c 300000 /dev/zero | tr '\\0' x >&2\ncat > /dev/null",
        );
        let samples = vec![0.25f32; 200_000];
        let output = tmp.path().join("o.mp3");
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(20),
            encode_pcm(&binary, &samples, 8_000, &output),
        )
        .await
        .expect("encoder stalled");
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn encoder_failure_reports_stderr() {
        let tmp = TempDir::new().unwrap();
        let binary = fake_encoder(tmp.path(), "echo 'unknown encoder' >&2\nexit 1");
        let output = tmp.path().join("o.mp3");
        let err = encode_pcm(&binary, &[0.1; 64], 8_000, &output)
            .await
            .unwrap_err();
        match err {
            MixError::ToolFailed(message) => assert!(message.contains("unknown encoder")),
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }
}

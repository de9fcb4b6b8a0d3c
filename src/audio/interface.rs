use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Speech weight in every mix.
pub const SPEECH_GAIN: f32 = 0.8;
/// Background-music weight in every mix.
pub const MUSIC_GAIN: f32 = 0.2;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MixError {
    #[error("external tool unavailable: {0}")]
    ToolUnavailable(String),
    #[error("external tool failed: {0}")]
    ToolFailed(String),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("resample error: {0}")]
    Resample(String),
    #[error("unsupported input: {0}")]
    Unsupported(String),
    #[error("sample count mismatch: speech {speech}, music {music}")]
    LengthMismatch { speech: usize, music: usize },
    #[error("background music unavailable: {0}")]
    MusicUnavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("all mixing strategies failed: {}", describe_failures(.0))]
    Exhausted(Vec<(String, String)>),
}

fn describe_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(strategy, reason)| format!("{}: {}", strategy, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of a successful mix or copy.
#[derive(Debug, Clone, PartialEq)]
pub struct MixOutcome {
    pub strategy: String,
    /// File actually written. May differ from the requested path when a
    /// strategy falls back to WAV.
    pub output: PathBuf,
}

// ── Strategy Trait ─────────────────────────────────────

/// One way of overlaying music on speech. The mixer tries strategies in
/// priority order until one succeeds.
#[async_trait]
pub trait MixStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Mix `speech` with `music` into `output`, returning the path written.
    async fn mix(&self, speech: &Path, music: &Path, output: &Path) -> Result<PathBuf, MixError>;
}

/// Where WAV-only strategies write for a requested output path.
pub fn wav_target(output: &Path) -> PathBuf {
    let is_wav = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_wav {
        output.to_path_buf()
    } else {
        output.with_extension("wav")
    }
}

/// Run blocking audio work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, MixError>
where
    F: FnOnce() -> Result<T, MixError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MixError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

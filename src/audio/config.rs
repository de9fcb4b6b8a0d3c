use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mixing strategies in the order the mixer may try them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Decode any container, resample, loop/trim music, encode by extension.
    Decoded,
    /// External ffmpeg filter graph.
    Ffmpeg,
    /// WAV-only float mix with resampling.
    Numeric,
    /// 16-bit frame mix, no resampling.
    Raw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,
    /// Per-style file overrides. Styles not listed map to `<music_dir>/<style>.mp3`.
    #[serde(default)]
    pub music_files: BTreeMap<String, PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Where unmixed speech is written before mixing.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music_dir: default_music_dir(),
            music_files: BTreeMap::new(),
            output_dir: default_output_dir(),
            work_dir: default_work_dir(),
            ffmpeg_path: default_ffmpeg_path(),
            strategies: default_strategies(),
        }
    }
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("background_music")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}
fn default_work_dir() -> PathBuf {
    std::env::temp_dir()
}
fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}
fn default_strategies() -> Vec<StrategyKind> {
    vec![
        StrategyKind::Decoded,
        StrategyKind::Ffmpeg,
        StrategyKind::Numeric,
        StrategyKind::Raw,
    ]
}

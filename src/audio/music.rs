//! Background-music asset store: style name → local audio file.

use super::config::AudioConfig;
use super::interface::MixError;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const NO_MUSIC: &str = "none";

#[derive(Debug, Clone, PartialEq)]
pub enum MusicSource {
    /// Style "none": speech only.
    Silent,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct MusicLibrary {
    files: BTreeMap<String, PathBuf>,
}

impl MusicLibrary {
    /// Map every known style to its file. `styles` may include "none", which is skipped.
    pub fn new<I, S>(config: &AudioConfig, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut files = BTreeMap::new();
        for style in styles {
            let style = style.as_ref().trim().to_lowercase();
            if style.is_empty() || style == NO_MUSIC {
                continue;
            }
            let path = config.music_dir.join(format!("{}.mp3", style));
            files.insert(style, path);
        }
        for (style, path) in &config.music_files {
            files.insert(style.trim().to_lowercase(), path.clone());
        }
        Self { files }
    }

    pub fn resolve(&self, style: &str) -> Result<MusicSource, MixError> {
        let style = style.trim().to_lowercase();
        if style.is_empty() || style == NO_MUSIC {
            return Ok(MusicSource::Silent);
        }
        let path = self
            .files
            .get(&style)
            .ok_or_else(|| MixError::MusicUnavailable(format!("unknown style '{}'", style)))?;
        if !path.is_file() {
            tracing::warn!(
                "[Mixer] Background music file not found: {}",
                path.display()
            );
            return Err(MixError::MusicUnavailable(format!(
                "file not found: {}",
                path.display()
            )));
        }
        Ok(MusicSource::File(path.clone()))
    }
}

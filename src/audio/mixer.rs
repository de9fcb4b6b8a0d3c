use super::config::{AudioConfig, StrategyKind};
use super::decoded::DecodedMixer;
use super::ffmpeg::FfmpegMixer;
use super::interface::{MixError, MixOutcome, MixStrategy};
use super::music::{MusicLibrary, MusicSource};
use super::numeric::NumericMixer;
use super::raw::RawMixer;
use std::path::Path;
use std::sync::Arc;

/// Strategy name reported when no mixing was needed.
pub const COPY_STRATEGY: &str = "copy";

/// Overlays background music on speech, trying each strategy in priority order.
pub struct AudioMixer {
    library: MusicLibrary,
    strategies: Vec<Arc<dyn MixStrategy>>,
}

impl AudioMixer {
    pub fn new(library: MusicLibrary, strategies: Vec<Arc<dyn MixStrategy>>) -> Self {
        Self {
            library,
            strategies,
        }
    }

    pub fn from_config<I, S>(config: &AudioConfig, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strategies = config
            .strategies
            .iter()
            .map(|kind| -> Arc<dyn MixStrategy> {
                match kind {
                    StrategyKind::Decoded => {
                        Arc::new(DecodedMixer::new(config.ffmpeg_path.clone()))
                    }
                    StrategyKind::Ffmpeg => Arc::new(FfmpegMixer::new(config.ffmpeg_path.clone())),
                    StrategyKind::Numeric => Arc::new(NumericMixer),
                    StrategyKind::Raw => Arc::new(RawMixer),
                }
            })
            .collect();
        Self::new(MusicLibrary::new(config, styles), strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Combine `speech` with the music for `style` into `output`.
    ///
    /// Style "none" copies the speech unchanged. Each failing strategy is
    /// logged and the next one tried; if all fail the reasons are returned
    /// together in [`MixError::Exhausted`].
    pub async fn add_background_music(
        &self,
        speech: &Path,
        style: &str,
        output: &Path,
    ) -> Result<MixOutcome, MixError> {
        let music = match self.library.resolve(style)? {
            MusicSource::Silent => {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                if speech != output {
                    tokio::fs::copy(speech, output).await?;
                }
                return Ok(MixOutcome {
                    strategy: COPY_STRATEGY.to_string(),
                    output: output.to_path_buf(),
                });
            }
            MusicSource::File(path) => path,
        };

        tracing::info!(
            "[Mixer] Adding '{}' background music from {}",
            style,
            music.display()
        );

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            match strategy.mix(speech, &music, output).await {
                Ok(written) => {
                    tracing::info!(
                        "[Mixer] Mixed with '{}' strategy into {}",
                        strategy.name(),
                        written.display()
                    );
                    return Ok(MixOutcome {
                        strategy: strategy.name().to_string(),
                        output: written,
                    });
                }
                Err(e) => {
                    tracing::warn!("[Mixer] Strategy '{}' failed: {}", strategy.name(), e);
                    failures.push((strategy.name().to_string(), e.to_string()));
                }
            }
        }

        tracing::warn!("[Mixer] Every mixing strategy failed");
        Err(MixError::Exhausted(failures))
    }
}

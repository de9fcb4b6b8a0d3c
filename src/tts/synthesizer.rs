use super::config::TtsConfig;
use super::interface::{SpeechBackend, SpeechRequest, TtsError, VoiceRecord, VoiceSettings};
use crate::voice::{ToneCategory, VoiceTables};
use std::path::Path;
use std::sync::Arc;

/// Caller choices for one synthesis call.
#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    /// Used unless `tone` names a canonical category.
    pub settings: Option<VoiceSettings>,
    pub tone: Option<String>,
    pub language: Option<String>,
}

/// Turns text into an audio file through a [`SpeechBackend`], shaping voice
/// settings by tone and the model by language.
pub struct SpeechSynthesizer {
    backend: Arc<dyn SpeechBackend>,
    tables: Arc<VoiceTables>,
    config: TtsConfig,
}

impl SpeechSynthesizer {
    pub fn new(
        backend: Arc<dyn SpeechBackend>,
        tables: Arc<VoiceTables>,
        config: TtsConfig,
    ) -> Self {
        Self {
            backend,
            tables,
            config,
        }
    }

    pub async fn list_voices(&self) -> Result<Vec<VoiceRecord>, TtsError> {
        self.backend.list_voices().await
    }

    /// Canonical tone → its fixed settings pair; anything else keeps `fallback`.
    pub fn settings_for(&self, tone: Option<&str>, fallback: VoiceSettings) -> VoiceSettings {
        match tone.and_then(ToneCategory::parse) {
            Some(tone) => {
                let settings = self.tables.tone(tone).settings;
                tracing::info!(
                    "[TTS] Applying '{}' tone settings (stability {}, similarity {})",
                    tone,
                    settings.stability,
                    settings.similarity_boost
                );
                settings
            }
            None => fallback,
        }
    }

    /// Recognized language → multilingual model plus its code. Unrecognized
    /// languages degrade to the monolingual model with a warning.
    pub fn model_for(&self, language: Option<&str>) -> (String, Option<String>) {
        let language = match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(l) => l,
            None => return (self.config.monolingual_model.clone(), None),
        };

        match self.tables.language(language) {
            Some(entry) => {
                tracing::info!(
                    "[TTS] Using multilingual model for {} ({})",
                    entry.name,
                    entry.code
                );
                (self.config.multilingual_model.clone(), Some(entry.code.clone()))
            }
            None => {
                tracing::warn!(
                    "[TTS] Language '{}' not recognized, using default model",
                    language
                );
                (self.config.monolingual_model.clone(), None)
            }
        }
    }

    /// Build the request that [`synthesize_to_file`](Self::synthesize_to_file) would send.
    pub fn build_request(
        &self,
        text: &str,
        voice_id: &str,
        options: &SynthesisOptions,
    ) -> SpeechRequest {
        let fallback = options.settings.unwrap_or(VoiceSettings {
            stability: self.config.default_stability,
            similarity_boost: self.config.default_similarity_boost,
        });
        let settings = self.settings_for(options.tone.as_deref(), fallback);
        let (model_id, language_code) = self.model_for(options.language.as_deref());
        SpeechRequest {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
            model_id,
            settings,
            language_code,
        }
    }

    /// Synthesize once and write the raw response bytes to `output`.
    pub async fn synthesize_to_file(
        &self,
        text: &str,
        voice_id: &str,
        output: &Path,
        options: &SynthesisOptions,
    ) -> Result<SpeechRequest, TtsError> {
        let request = self.build_request(text, voice_id, options);
        tracing::info!(
            "[TTS] Synthesizing {} chars with voice {} via {}",
            text.chars().count(),
            voice_id,
            self.backend.id()
        );
        let bytes = self.backend.synthesize(&request).await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &bytes).await?;
        tracing::info!("[TTS] Wrote {} bytes to {}", bytes.len(), output.display());
        Ok(request)
    }
}

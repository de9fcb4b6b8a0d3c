//! End-to-end speech job: classify tone, pick a voice, synthesize, mix.

use crate::audio::{AudioConfig, AudioMixer, MixError};
use crate::config::AppConfig;
use crate::tts::{
    ElevenLabsClient, SpeechSynthesizer, SynthesisOptions, TtsError, VoiceRecord, VoiceSettings,
};
use crate::voice::{
    classify_tone, filter_voices, select_best_voice, Gender, ToneCategory, VoiceSelectionCriteria,
    VoiceTables,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Tts(#[from] TtsError),
    #[error(transparent)]
    Mix(#[from] MixError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One speech request. Everything but the script is optional.
#[derive(Debug, Clone, Default)]
pub struct SpeechJob {
    pub script: String,
    /// Skip auto-selection and use this voice.
    pub voice_id: Option<String>,
    pub tone: Option<String>,
    pub gender: Option<String>,
    pub background_music: Option<String>,
    pub language: Option<String>,
    /// Used when the tone does not resolve to a category.
    pub settings: Option<VoiceSettings>,
    /// Defaults to `<output_dir>/<output_filename(..)>`.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOutcome {
    pub output: PathBuf,
    pub voice_id: String,
    pub tone: Option<ToneCategory>,
    /// Mixing strategy used; `None` when no music was mixed in.
    pub mix_strategy: Option<String>,
}

fn slug(part: Option<&str>, fallback: &str) -> String {
    let part = part
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(fallback);
    part.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// `<tone>_<gender>_<language>_<music>.mp3`, deterministic per combination.
pub fn output_filename(
    tone: Option<&str>,
    gender: Option<&str>,
    language: Option<&str>,
    background_music: Option<&str>,
) -> String {
    format!(
        "{}_{}_{}_{}.mp3",
        slug(tone, "default"),
        slug(gender, "neutral"),
        slug(language, "english"),
        slug(background_music, "none")
    )
}

pub struct SpeechPipeline {
    tables: Arc<VoiceTables>,
    synthesizer: SpeechSynthesizer,
    mixer: AudioMixer,
    output_dir: PathBuf,
    work_dir: PathBuf,
}

impl SpeechPipeline {
    pub fn new(
        tables: Arc<VoiceTables>,
        synthesizer: SpeechSynthesizer,
        mixer: AudioMixer,
        audio: &AudioConfig,
    ) -> Self {
        Self {
            tables,
            synthesizer,
            mixer,
            output_dir: audio.output_dir.clone(),
            work_dir: audio.work_dir.clone(),
        }
    }

    /// Wire the ElevenLabs backend and the configured mixer. Fails when no
    /// TTS API key resolves.
    pub fn from_config(
        config: &AppConfig,
        tables: Arc<VoiceTables>,
    ) -> Result<Self, PipelineError> {
        let backend = ElevenLabsClient::from_config(&config.tts)?;
        let synthesizer =
            SpeechSynthesizer::new(Arc::new(backend), tables.clone(), config.tts.clone());
        let styles: Vec<String> = tables
            .music_styles()
            .iter()
            .map(|m| m.style.clone())
            .collect();
        let mixer = AudioMixer::from_config(&config.audio, styles);
        Ok(Self::new(tables, synthesizer, mixer, &config.audio))
    }

    /// Resolve free-text request fields into selection criteria.
    pub fn criteria(
        &self,
        tone: Option<&str>,
        gender: Option<&str>,
        language: Option<&str>,
    ) -> VoiceSelectionCriteria {
        let tone = tone.and_then(|t| classify_tone(&self.tables, t));
        let gender = gender.and_then(|g| {
            let parsed = Gender::parse(g);
            if parsed.is_none() {
                tracing::warn!("[Voice] Unknown gender '{}', not filtering by gender", g);
            }
            parsed
        });
        VoiceSelectionCriteria {
            tone,
            gender,
            language: language
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty()),
        }
    }

    /// Voices passing the keyword listing filter.
    pub async fn matching_voices(
        &self,
        criteria: &VoiceSelectionCriteria,
    ) -> Result<Vec<VoiceRecord>, PipelineError> {
        let voices = self.synthesizer.list_voices().await?;
        Ok(filter_voices(&self.tables, &voices, criteria))
    }

    async fn choose_voice(
        &self,
        criteria: &VoiceSelectionCriteria,
    ) -> Result<String, PipelineError> {
        let voices = self.synthesizer.list_voices().await?;
        if voices.is_empty() {
            return Err(TtsError::NoVoices.into());
        }

        let mut candidates = filter_voices(&self.tables, &voices, criteria);
        if candidates.is_empty() {
            tracing::warn!(
                "[Voice] No voices match the requested criteria, considering all voices"
            );
            candidates = voices;
        }

        select_best_voice(&self.tables, &candidates, criteria)
            .map(|best| best.voice.voice_id.clone())
            .ok_or_else(|| TtsError::NoVoices.into())
    }

    pub async fn run(&self, job: &SpeechJob) -> Result<SpeechOutcome, PipelineError> {
        let criteria = self.criteria(
            job.tone.as_deref(),
            job.gender.as_deref(),
            job.language.as_deref(),
        );

        let voice_id = match &job.voice_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => {
                tracing::info!("[Voice] No voice ID provided, auto-selecting");
                self.choose_voice(&criteria).await?
            }
        };

        let output = job.output.clone().unwrap_or_else(|| {
            self.output_dir.join(output_filename(
                job.tone.as_deref(),
                job.gender.as_deref(),
                job.language.as_deref(),
                job.background_music.as_deref(),
            ))
        });

        let options = SynthesisOptions {
            settings: job.settings,
            tone: criteria.tone.map(|t| t.as_str().to_string()),
            language: criteria.language.clone(),
        };

        let style = job
            .background_music
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty() && s != crate::audio::music::NO_MUSIC);

        let style = match style {
            None => {
                self.synthesizer
                    .synthesize_to_file(&job.script, &voice_id, &output, &options)
                    .await?;
                return Ok(SpeechOutcome {
                    output,
                    voice_id,
                    tone: criteria.tone,
                    mix_strategy: None,
                });
            }
            Some(style) => style,
        };

        let temp = self
            .work_dir
            .join(format!("speech-{}.mp3", uuid::Uuid::new_v4()));
        self.synthesizer
            .synthesize_to_file(&job.script, &voice_id, &temp, &options)
            .await?;

        let outcome = match self.mixer.add_background_music(&temp, &style, &output).await {
            Ok(mixed) => {
                if let Err(e) = tokio::fs::remove_file(&temp).await {
                    tracing::debug!("[Mixer] Could not remove {}: {}", temp.display(), e);
                }
                SpeechOutcome {
                    output: mixed.output,
                    voice_id,
                    tone: criteria.tone,
                    mix_strategy: Some(mixed.strategy),
                }
            }
            Err(e) => {
                tracing::warn!(
                    "[Mixer] Background music failed ({}), keeping speech without music",
                    e
                );
                move_file(&temp, &output).await?;
                SpeechOutcome {
                    output,
                    voice_id,
                    tone: criteria.tone,
                    mix_strategy: None,
                }
            }
        };
        Ok(outcome)
    }
}

/// Rename, falling back to copy + delete across filesystems.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::audio::{AudioConfig, StrategyKind};
    use crate::tts::TtsConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn voices_json() -> serde_json::Value {
        serde_json::json!({
            "voices": [
                {"voice_id": "v-adam", "name": "Adam", "category": "premade",
                 "description": "deep male narrator voice", "labels": {"gender": "male"}},
                {"voice_id": "v-emma", "name": "Emma", "category": "premade",
                 "description": "warm female voice", "labels": {"gender": "female"}},
                {"voice_id": "v-lucia", "name": "Lucia", "category": "premade",
                 "description": "soft female voice, habla español", "labels": {"language": "es"}}
            ]
        })
    }

    /// 16-bit mono WAV bytes, standing in for TTS audio.
    pub fn wav_bytes(amplitude: f32, len: usize) -> Vec<u8> {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.wav");
        crate::audio::pcm::write_wav_i16(&path, &vec![amplitude; len], 8_000).unwrap();
        std::fs::read(path).unwrap()
    }

    pub async fn mock_voices(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/voices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(voices_json()))
            .mount(server)
            .await;
    }

    pub fn audio_config(root: &Path) -> AudioConfig {
        let music_dir = root.join("music");
        std::fs::create_dir_all(&music_dir).unwrap();
        crate::audio::pcm::write_wav_i16(&music_dir.join("ambient.mp3"), &vec![0.5; 100], 8_000)
            .unwrap();
        std::fs::write(music_dir.join("upbeat.mp3"), b"garbage").unwrap();
        let work_dir = root.join("work");
        std::fs::create_dir_all(&work_dir).unwrap();
        AudioConfig {
            music_dir,
            output_dir: root.join("outputs"),
            work_dir,
            ffmpeg_path: "/nonexistent/ffmpeg-binary".into(),
            strategies: vec![StrategyKind::Numeric],
            ..Default::default()
        }
    }

    pub fn pipeline(server: &MockServer, audio: &AudioConfig) -> SpeechPipeline {
        let tables = Arc::new(VoiceTables::builtin().unwrap());
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let backend = ElevenLabsClient::with_client(http, "k".into(), server.uri());
        let synthesizer =
            SpeechSynthesizer::new(Arc::new(backend), tables.clone(), TtsConfig::default());
        let styles: Vec<String> = tables
            .music_styles()
            .iter()
            .map(|m| m.style.clone())
            .collect();
        let mixer = AudioMixer::from_config(audio, styles);
        SpeechPipeline::new(tables, synthesizer, mixer, audio)
    }

    /// Formatted log lines written while the returned guard is alive.
    #[derive(Clone, Default)]
    pub struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl CapturedLogs {
        pub fn start() -> (Self, tracing::subscriber::DefaultGuard) {
            let logs = Self::default();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(logs.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish();
            (logs, tracing::subscriber::set_default(subscriber))
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

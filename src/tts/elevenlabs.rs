use super::config::TtsConfig;
use super::interface::{SpeechBackend, SpeechRequest, TtsError, VoiceRecord, VoiceSettings};
use crate::utils::http::check_status;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "xi-api-key";

/// ElevenLabs REST backend.
///
/// `POST {base}/text-to-speech/{voice_id}` returns audio bytes,
/// `GET {base}/voices` lists the account's voices.
pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct SynthesisBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<VoiceRecord>,
}

impl ElevenLabsClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TtsError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self::with_client(client, api_key, base_url))
    }

    pub fn with_client(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from config. Fails with [`TtsError::Config`] when no API key resolves.
    pub fn from_config(config: &TtsConfig) -> Result<Self, TtsError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            TtsError::Config(format!(
                "ElevenLabs API key not found. Set {} or tts.api_key in the config file",
                config.api_key_env.as_deref().unwrap_or("ELEVENLABS_API_KEY")
            ))
        })?;
        Self::new(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl SpeechBackend for ElevenLabsClient {
    fn id(&self) -> String {
        "elevenlabs".to_string()
    }

    async fn list_voices(&self) -> Result<Vec<VoiceRecord>, TtsError> {
        let url = format!("{}/voices", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("voices request failed: {}", e)))?;
        let response = check_status(response, "ElevenLabs voices").await?;

        let body: VoicesResponse = response
            .json()
            .await
            .map_err(|e| TtsError::Decode(format!("voices response: {}", e)))?;
        tracing::debug!("[TTS] Retrieved {} voices", body.voices.len());
        Ok(body.voices)
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, TtsError> {
        let url = format!("{}/text-to-speech/{}", self.base_url, request.voice_id);
        let body = SynthesisBody {
            text: &request.text,
            model_id: &request.model_id,
            voice_settings: request.settings,
            language_code: request.language_code.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("synthesis request failed: {}", e)))?;
        let response = check_status(response, "ElevenLabs synthesis").await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Transport(format!("synthesis body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

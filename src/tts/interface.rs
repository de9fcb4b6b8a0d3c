use crate::utils::http::UpstreamFailure;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ── Error Types ────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TtsError {
    /// Missing credential or unusable settings. Not retried.
    #[error("TTS config error: {0}")]
    Config(String),
    #[error("TTS API error ({status}): {body}")]
    Upstream {
        status: u16,
        body: String,
        retryable: bool,
    },
    #[error("TTS request failed: {0}")]
    Transport(String),
    #[error("TTS response could not be decoded: {0}")]
    Decode(String),
    #[error("TTS output error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No voices available from the TTS provider")]
    NoVoices,
}

impl TtsError {
    /// Whether the caller may reasonably try the same request again.
    pub fn is_retryable(&self) -> bool {
        match self {
            TtsError::Upstream { retryable, .. } => *retryable,
            TtsError::Transport(_) => true,
            _ => false,
        }
    }
}

impl From<UpstreamFailure> for TtsError {
    fn from(f: UpstreamFailure) -> Self {
        TtsError::Upstream {
            status: f.status,
            body: f.body,
            retryable: f.retryable,
        }
    }
}

// ── Voice Records ──────────────────────────────────────

/// A voice as listed by the TTS provider. Read-only, fetched per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceRecord {
    pub voice_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_labels")]
    pub labels: BTreeMap<String, String>,
}

impl VoiceRecord {
    /// Render labels as `{key: value, key: value}` in key order.
    pub fn labels_text(&self) -> String {
        let inner = self
            .labels
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{}}}", inner)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Label values are usually strings; anything else is kept in its JSON form.
fn lenient_labels<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, v)
        })
        .collect())
}

// ── Synthesis Parameters ───────────────────────────────

/// Expressiveness vs. consistency knobs sent with every synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub settings: VoiceSettings,
    /// ISO-639-1 code, only set for multilingual synthesis.
    pub language_code: Option<String>,
}

// ── Backend Trait ──────────────────────────────────────

#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Unique identifier for this backend (e.g. "elevenlabs").
    fn id(&self) -> String;

    /// List every voice the backend offers.
    async fn list_voices(&self) -> Result<Vec<VoiceRecord>, TtsError>;

    /// Synthesize text to raw audio bytes. Single attempt, no retry.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, TtsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_record_tolerates_nulls_and_missing_fields() {
        let json = r#"{
            "voice_id": "abc",
            "name": "Rachel",
            "description": null,
            "labels": {"accent": "american", "age": 30, "use_case": null}
        }"#;
        let voice: VoiceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(voice.voice_id, "abc");
        assert_eq!(voice.category, "");
        assert_eq!(voice.description, "");
        assert_eq!(voice.labels["age"], "30");
        assert_eq!(voice.labels["use_case"], "");
    }

    #[test]
    fn labels_render_in_key_order() {
        let mut voice = VoiceRecord::default();
        voice.labels.insert("gender".into(), "male".into());
        voice.labels.insert("accent".into(), "british".into());
        assert_eq!(voice.labels_text(), "{accent: british, gender: male}");
        assert_eq!(VoiceRecord::default().labels_text(), "{}");
    }

    #[test]
    fn upstream_failures_keep_retry_hint() {
        let err = TtsError::from(UpstreamFailure {
            status: 503,
            body: "busy".into(),
            retryable: true,
        });
        assert!(err.is_retryable());
        assert!(!TtsError::Config("no key".into()).is_retryable());
        assert!(err.to_string().contains("503"));
    }
}

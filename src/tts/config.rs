use serde::{Deserialize, Serialize};

// ── TTS Config ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when no (recognized) language is requested.
    #[serde(default = "default_monolingual_model")]
    pub monolingual_model: String,
    #[serde(default = "default_multilingual_model")]
    pub multilingual_model: String,
    #[serde(default = "default_setting")]
    pub default_stability: f64,
    #[serde(default = "default_setting")]
    pub default_similarity_boost: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TtsConfig {
    /// Resolve the API key: check `api_key` field first, then `api_key_env` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        crate::config::resolve_api_key(&self.api_key, &self.api_key_env)
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            monolingual_model: default_monolingual_model(),
            multilingual_model: default_multilingual_model(),
            default_stability: default_setting(),
            default_similarity_boost: default_setting(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> Option<String> {
    Some("ELEVENLABS_API_KEY".to_string())
}
fn default_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}
fn default_monolingual_model() -> String {
    "eleven_monolingual_v1".to_string()
}
fn default_multilingual_model() -> String {
    "eleven_multilingual_v2".to_string()
}
fn default_setting() -> f64 {
    0.5
}
fn default_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_uses_defaults() {
        let config: TtsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api_key_env.as_deref(), Some("ELEVENLABS_API_KEY"));
        assert_eq!(config.multilingual_model, "eleven_multilingual_v2");
        assert_eq!(config.default_stability, 0.5);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn inline_key_resolves() {
        let config = TtsConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));
    }
}

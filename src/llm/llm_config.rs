//! LLM configuration, the `llm` section of the app config.

use super::provider::LlmParams;
use crate::config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        config::resolve_api_key(&self.api_key, &self.api_key_env)
    }

    pub fn params(&self) -> LlmParams {
        LlmParams {
            temperature: Some(self.temperature),
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            top_p: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

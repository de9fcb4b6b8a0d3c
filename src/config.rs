//! Shared config utilities for loading JSON config files
//! and resolving API keys from fields or environment variables.

use crate::audio::config::AudioConfig;
use crate::llm::llm_config::LlmConfig;
use crate::tts::config::TtsConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "audiomate.json";

// ── Server Config ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

// ── Top-Level Config ───────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Alternative keyword-table file. The embedded table is used when unset.
    #[serde(default)]
    pub voice_tables: Option<PathBuf>,
}

/// Load the application config. Falls back to defaults if the file is missing or invalid.
pub fn load_config(path: &Path) -> AppConfig {
    load_json_config(path, "Config")
}

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                tracing::info!("[{}] Loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] Failed to parse config {}: {}, using defaults",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            tracing::info!(
                "[{}] No config file at {}, using defaults",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Resolve an API key: check the direct `api_key` field first,
/// then fall back to reading the environment variable named in `api_key_env`.
pub fn resolve_api_key(api_key: &Option<String>, api_key_env: &Option<String>) -> Option<String> {
    if let Some(ref key) = api_key {
        if !key.is_empty() {
            return Some(key.clone());
        }
    }
    if let Some(ref env_var) = api_key_env {
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                return Some(key);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.json"));
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.tts.base_url, "https://api.elevenlabs.io/v1");
        assert!(config.voice_tables.is_none());
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = load_config(&path);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audiomate.json");
        std::fs::write(
            &path,
            r#"{ "server": { "port": 8080 }, "llm": { "model": "gpt-4o-mini" } }"#,
        )
        .unwrap();
        let config = load_config(&path);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.audio.output_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn inline_key_wins_over_env() {
        let key = resolve_api_key(
            &Some("inline".to_string()),
            &Some("AUDIOMATE_TEST_UNSET_VAR".to_string()),
        );
        assert_eq!(key.as_deref(), Some("inline"));
    }

    #[test]
    fn empty_inline_key_falls_through() {
        let key = resolve_api_key(
            &Some(String::new()),
            &Some("AUDIOMATE_TEST_DEFINITELY_UNSET".to_string()),
        );
        assert!(key.is_none());
    }
}

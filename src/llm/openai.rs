use super::llm_config::LlmConfig;
use super::provider::{LlmError, LlmParams, LlmProvider};
use crate::utils::http::check_status;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAIClient {
    pub fn new(client: Client, api_key: String, base_url: String, model: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build from config. Fails with [`LlmError::Config`] when no API key resolves.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            LlmError::Config(format!(
                "OpenAI API key not found. Set {} or llm.api_key in the config file",
                config.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY")
            ))
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("HTTP client: {}", e)))?;
        let client = Self::new(
            client,
            api_key,
            config.base_url.clone(),
            config.model.clone(),
        );
        Ok(client.with_temperature(config.temperature))
    }

    /// Non-streaming chat completion. Returns the first choice's content.
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        options: Option<LlmParams>,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let opts = options.unwrap_or_default();
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            temperature: opts.temperature.or(Some(self.temperature)),
            max_tokens: opts.max_tokens,
            top_p: opts.top_p,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        let response = check_status(response, "OpenAI chat").await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse response: {}", e)))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        Ok(content)
    }
}

#[async_trait]
impl LlmProvider for OpenAIClient {
    async fn complete(
        &self,
        prompt: &str,
        options: Option<LlmParams>,
    ) -> Result<String, LlmError> {
        self.chat(vec![Message::user(prompt)], options).await
    }

    fn id(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAIClient {
        let http = Client::builder().no_proxy().build().unwrap();
        OpenAIClient::new(http, "sk-test".into(), server.uri(), "gpt-4o".into())
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Write an ad"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Buy now!"}}]
            })))
            .mount(&server)
            .await;

        let text = client(&server).complete("Write an ad", None).await.unwrap();
        assert_eq!(text, "Buy now!");
    }

    #[tokio::test]
    async fn sampling_params_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "max_tokens": 120,
                "top_p": 0.5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = LlmParams {
            temperature: None,
            max_tokens: Some(120),
            top_p: Some(0.5),
        };
        let text = client(&server).complete("x", Some(params)).await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn rate_limit_is_retryable_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        match client(&server).complete("x", None).await {
            Err(LlmError::Upstream {
                status, retryable, ..
            }) => {
                assert_eq!(status, 429);
                assert!(retryable);
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn missing_key_is_config_error() {
        let config = LlmConfig {
            api_key_env: Some("AUDIOMATE_TEST_NO_OPENAI_KEY".into()),
            ..Default::default()
        };
        assert!(matches!(
            OpenAIClient::from_config(&config),
            Err(LlmError::Config(_))
        ));
    }
}

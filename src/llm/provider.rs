//! Prompt-to-text provider trait shared by the script generator.

use crate::utils::http::UpstreamFailure;
use async_trait::async_trait;
use thiserror::Error;

// ── Common Parameters ──────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct LlmParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM config error: {0}")]
    Config(String),
    #[error("LLM API error ({status}): {body}")]
    Upstream {
        status: u16,
        body: String,
        retryable: bool,
    },
    #[error("LLM request failed: {0}")]
    Transport(String),
    #[error("LLM returned an empty completion")]
    EmptyCompletion,
    #[error("Missing required fields: {}", .0.join(", "))]
    Template(Vec<String>),
}

impl From<UpstreamFailure> for LlmError {
    fn from(f: UpstreamFailure) -> Self {
        LlmError::Upstream {
            status: f.status,
            body: f.body,
            retryable: f.retryable,
        }
    }
}

/// Common interface for LLM providers. A single prompt in, generated text out.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str, options: Option<LlmParams>) -> Result<String, LlmError>;

    /// Provider identifier (e.g. "openai").
    fn id(&self) -> &str;
}

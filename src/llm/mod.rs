pub mod llm_config;
pub mod openai;
pub mod provider;
pub mod script;

pub use llm_config::LlmConfig;
pub use openai::OpenAIClient;
pub use provider::{LlmError, LlmParams, LlmProvider};
pub use script::{CampaignInput, ScriptGenerator, REQUIRED_FIELDS};

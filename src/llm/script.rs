//! Ad-script generation: campaign brief → copywriter prompt → LLM completion.

use super::provider::{LlmError, LlmParams, LlmProvider};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Fields a campaign brief must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "product_name",
    "product_details",
    "company_context",
    "target_audience",
    "distribution_method",
    "desired_length",
    "example_output",
    "language",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInput {
    pub product_name: String,
    pub product_details: String,
    pub company_context: String,
    pub target_audience: String,
    pub distribution_method: String,
    /// Target duration in seconds.
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub desired_length: u32,
    pub example_output: String,
    pub language: String,
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("desired_length '{}' is not a number", s))
        }),
    }
}

/// Required fields absent (or null) in a raw JSON brief.
pub fn missing_fields(body: &serde_json::Value) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| body.get(**field).map_or(true, |v| v.is_null()))
        .map(|field| field.to_string())
        .collect()
}

impl CampaignInput {
    /// Validate and parse a raw JSON brief.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, LlmError> {
        let missing = missing_fields(body);
        if !missing.is_empty() {
            return Err(LlmError::Template(missing));
        }
        serde_json::from_value(body.clone())
            .map_err(|e| LlmError::Config(format!("invalid campaign input: {}", e)))
    }

    /// Fill the copywriter prompt with this brief.
    pub fn render_prompt(&self) -> String {
        format!(
            r#"You are an expert creative copywriter specializing in high-conversion *audio advertisements*.
Your task is to write a compelling, natural-sounding script for an audio ad.

### INSTRUCTIONS:
1. The ad must centralize around the product {product_name} and highlight the unique value proposition highlighted in the following product details:
<product_details>
{product_details}
</product_details>

2. Align the message of the ad with company values and marketing message highlighted in the following company details:
<company_context>
{company_context}
</company_context>

3. Tailor the ad to the {target_audience} so that the product speaks directly to their motivations and lifestyle

4. Adapt the language to fit {distribution_method} as the distribution platform (e.g., more casual for Spotify, more formal for traditional radio)

5. You must ensure that the pacing fits the target duration of {desired_length} seconds (e.g., 15 seconds ≈ ~35 words, 30 seconds ≈ ~75 words)

6. The script should be in the following language: {language}

### EXAMPLE SCRIPT:
The following script is an example of a previous ad produced for the company.
You should match the tone and energy of the example, but do NOT copy its details in terms of length, product, etc.

<example_script>
{example_output}
</example_script>

### OUTPUT FORMAT:
Return only the spoken script as plain text.
You may use the following tags to enhance emotional expression:
- [laughs], [laughs harder], [starts laughing], [wheezing]
- [whispers]
- [sighs], [exhales]
- [sarcastic], [curious], [excited], [crying], [snorts], [mischievously]

Punctuation should be intentional to enhance the delivery of the script.
- Ellipses (…) add pauses and weight
- Capitalization increases emphasis
- Standard punctuation provides natural speech rhythm

Do not include any of the following:
- Speaker identifiers (e.g., "Narrator:", "Voiceover:")
- Audio or music cues (e.g., "[Music fades in]", "(cheerful tone)")
"#,
            product_name = self.product_name,
            product_details = self.product_details,
            company_context = self.company_context,
            target_audience = self.target_audience,
            distribution_method = self.distribution_method,
            desired_length = self.desired_length,
            language = self.language,
            example_output = self.example_output,
        )
    }
}

pub struct ScriptGenerator {
    provider: Arc<dyn LlmProvider>,
    params: Option<LlmParams>,
}

impl ScriptGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            params: None,
        }
    }

    /// Sampling parameters sent with every completion.
    pub fn with_params(mut self, params: LlmParams) -> Self {
        self.params = Some(params);
        self
    }

    pub async fn generate(&self, input: &CampaignInput) -> Result<String, LlmError> {
        let prompt = input.render_prompt();
        tracing::info!(
            "[LLM] Generating {}s script for '{}' via {}",
            input.desired_length,
            input.product_name,
            self.provider.id()
        );
        let script = self.provider.complete(&prompt, self.params.clone()).await?;
        let script = script.trim();
        if script.is_empty() {
            tracing::warn!("[LLM] Provider returned an empty script");
            return Err(LlmError::EmptyCompletion);
        }
        Ok(script.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: String,
        prompts: Mutex<Vec<String>>,
        params: Mutex<Vec<Option<LlmParams>>>,
    }

    impl Canned {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
                params: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Canned {
        async fn complete(
            &self,
            prompt: &str,
            params: Option<LlmParams>,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.params.lock().unwrap().push(params);
            Ok(self.reply.clone())
        }

        fn id(&self) -> &str {
            "canned"
        }
    }

    fn brief() -> serde_json::Value {
        serde_json::json!({
            "product_name": "AquaPure",
            "product_details": "Filters 99% of impurities",
            "company_context": "Clean water for everyone",
            "target_audience": "young parents",
            "distribution_method": "Spotify",
            "desired_length": "30",
            "example_output": "Thirsty? ...",
            "language": "English"
        })
    }

    #[test]
    fn reports_missing_fields_in_order() {
        let mut body = brief();
        let obj = body.as_object_mut().unwrap();
        obj.remove("language");
        obj.remove("product_name");
        assert_eq!(missing_fields(&body), vec!["product_name", "language"]);
        let err = CampaignInput::from_json(&body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: product_name, language"
        );
    }

    #[test]
    fn desired_length_accepts_number_or_string() {
        assert_eq!(
            CampaignInput::from_json(&brief()).unwrap().desired_length,
            30
        );
        let mut body = brief();
        body["desired_length"] = serde_json::json!(15);
        assert_eq!(CampaignInput::from_json(&body).unwrap().desired_length, 15);
        body["desired_length"] = serde_json::json!("half a minute");
        assert!(CampaignInput::from_json(&body).is_err());
    }

    #[test]
    fn prompt_contains_every_field() {
        let prompt = CampaignInput::from_json(&brief()).unwrap().render_prompt();
        let needles = [
            "AquaPure",
            "young parents",
            "Spotify",
            "30 seconds",
            "Thirsty? ...",
            "English",
        ];
        for needle in needles {
            assert!(prompt.contains(needle), "prompt is missing {}", needle);
        }
    }

    #[tokio::test]
    async fn generator_trims_completion() {
        let provider = Arc::new(Canned::new("\n  Stay hydrated with AquaPure.  \n"));
        let generator = ScriptGenerator::new(provider.clone());
        let input = CampaignInput::from_json(&brief()).unwrap();
        let script = generator.generate(&input).await.unwrap();
        assert_eq!(script, "Stay hydrated with AquaPure.");
        assert!(provider.prompts.lock().unwrap()[0].contains("AquaPure"));
    }

    #[tokio::test]
    async fn blank_completion_is_an_error() {
        let generator = ScriptGenerator::new(Arc::new(Canned::new("   ")));
        let input = CampaignInput::from_json(&brief()).unwrap();
        assert!(matches!(
            generator.generate(&input).await,
            Err(LlmError::EmptyCompletion)
        ));
    }

    #[tokio::test]
    async fn configured_params_reach_the_provider() {
        let provider = Arc::new(Canned::new("Short and sweet."));
        let params = LlmParams {
            temperature: Some(0.3),
            max_tokens: Some(200),
            top_p: None,
        };
        let generator = ScriptGenerator::new(provider.clone()).with_params(params);
        let input = CampaignInput::from_json(&brief()).unwrap();
        generator.generate(&input).await.unwrap();

        let params = provider.params.lock().unwrap();
        let sent = params[0].as_ref().unwrap();
        assert_eq!(sent.max_tokens, Some(200));
        assert_eq!(sent.temperature, Some(0.3));
    }
}

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

use crate::contracts::{
    validate_extraction, validate_post_variants, Extraction, PostVariant, ValidationIssues,
};
use crate::error::{CitecastError, Result};
use crate::llm::json::parse_json;
use crate::llm::prompts::{build_extraction_prompt, build_post_generation_prompt, build_repair_prompt};
use crate::llm::{ExtractClaimsInput, GeneratePostsInput, LlmProvider};

/// One raw prompt-in, text-out call against a hosted model.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Provider id used in errors and logs.
    fn service(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Turns a [`TextCompletion`] into an [`LlmProvider`] that decodes, validates
/// and, on failure, asks the model once to repair its own output.
pub struct RepairingProvider<C> {
    client: C,
}

impl<C: TextCompletion> RepairingProvider<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    async fn complete_validated<T, F>(&self, prompt: &str, validate: F) -> Result<T>
    where
        F: Fn(&Value) -> std::result::Result<T, ValidationIssues> + Send + Sync,
        T: Send,
    {
        let provider = self.client.service();
        let raw = self.client.complete(prompt).await?;

        let details = match check_output(provider, &raw, &validate) {
            Ok(value) => return Ok(value),
            Err(details) => details,
        };

        warn!("{} output failed validation, requesting one repair", provider);
        debug!("{} validation details: {}", provider, details);

        let repaired = self
            .client
            .complete(&build_repair_prompt(&raw, &details))
            .await?;

        check_output(provider, &repaired, &validate).map_err(|details| {
            CitecastError::ResponseValidation {
                provider: provider.to_string(),
                message: format!("{} output is invalid after one repair attempt", provider),
                details,
            }
        })
    }
}

/// Decodes and validates `raw`, returning the diagnostics text on failure.
fn check_output<T, F>(provider: &str, raw: &str, validate: &F) -> std::result::Result<T, String>
where
    F: Fn(&Value) -> std::result::Result<T, ValidationIssues>,
{
    let value = parse_json(raw, provider).map_err(|e| e.to_string())?;
    validate(&value).map_err(|issues| issues.to_json())
}

#[async_trait]
impl<C: TextCompletion> LlmProvider for RepairingProvider<C> {
    fn id(&self) -> &str {
        self.client.service()
    }

    async fn extract_claims(&self, input: &ExtractClaimsInput) -> Result<Extraction> {
        let prompt = build_extraction_prompt(input);
        self.complete_validated(&prompt, validate_extraction).await
    }

    async fn generate_posts(&self, input: &GeneratePostsInput) -> Result<Vec<PostVariant>> {
        let prompt = build_post_generation_prompt(input);
        self.complete_validated(&prompt, validate_post_variants)
            .await
    }
}

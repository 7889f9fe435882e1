//! Generative-text layer: prompts, provider adapters, the single-repair
//! validation loop and the primary/fallback router.

pub mod gemini;
pub mod groq;
pub mod json;
pub mod prompts;
pub mod repair;
pub mod router;

use async_trait::async_trait;

use crate::contracts::{Extraction, Platform, PostVariant};
use crate::error::Result;

pub use gemini::GeminiClient;
pub use groq::GroqClient;
pub use repair::{RepairingProvider, TextCompletion};
pub use router::{LlmRouter, Sleeper, TokioSleeper};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractClaimsInput {
    pub document_text: String,
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratePostsInput {
    pub extraction: Extraction,
    pub audience: Option<String>,
    pub preferred_platforms: Option<Vec<Platform>>,
}

impl GeneratePostsInput {
    pub fn new(extraction: Extraction) -> Self {
        Self {
            extraction,
            audience: None,
            preferred_platforms: None,
        }
    }
}

/// Anything that can answer the two structured calls the pipeline makes.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn extract_claims(&self, input: &ExtractClaimsInput) -> Result<Extraction>;

    async fn generate_posts(&self, input: &GeneratePostsInput) -> Result<Vec<PostVariant>>;
}

/// Gemini primary with Groq fallback, both behind the repair loop.
pub fn default_router(config: &crate::config::LlmConfig) -> Result<LlmRouter> {
    let primary = RepairingProvider::new(GeminiClient::new(&config.gemini, config.timeout_ms)?);
    let fallback = RepairingProvider::new(GroqClient::new(&config.groq, config.timeout_ms)?);
    Ok(LlmRouter::new(
        std::sync::Arc::new(primary),
        std::sync::Arc::new(fallback),
        config
            .primary_backoff_ms
            .iter()
            .map(|ms| std::time::Duration::from_millis(*ms))
            .collect(),
    ))
}

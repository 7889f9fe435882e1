use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::Instrument;

use crate::config::ProviderConfig;
use crate::error::{CitecastError, Result};
use crate::http::{build_client, send_json};
use crate::llm::repair::TextCompletion;

const SERVICE: &str = "groq";

/// Groq's OpenAI-compatible chat completions API.
pub struct GroqClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GroqClient {
    pub fn new(config: &ProviderConfig, timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_millis(timeout_ms))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.resolve()?,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [{ "role": "user", "content": prompt }]
        })
    }
}

pub(crate) fn response_text(payload: &Value) -> Option<String> {
    let text = payload
        .pointer("/choices/0/message/content")?
        .as_str()?
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl TextCompletion for GroqClient {
    fn service(&self) -> &str {
        SERVICE
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            CitecastError::Configuration("GROQ_API_KEY is required for the Groq provider".to_string())
        })?;

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&self.request_body(prompt));

        let (status, payload) = send_json(SERVICE, request)
            .instrument(tracing::info_span!("llm.groq", model = %self.model))
            .await?;

        response_text(&payload).ok_or_else(|| {
            CitecastError::external(
                SERVICE,
                Some(status.as_u16()),
                "Groq response did not include text output",
            )
        })
    }
}

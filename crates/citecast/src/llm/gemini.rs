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

const SERVICE: &str = "gemini";

/// Google Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig, timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_millis(timeout_ms))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.resolve()?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

pub(crate) fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": 0.2,
            "responseMimeType": "application/json"
        }
    })
}

/// Joins every text part of the first candidate.
pub(crate) fn response_text(payload: &Value) -> Option<String> {
    let parts = payload
        .pointer("/candidates/0/content/parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .map(|part| part.get("text").and_then(Value::as_str).unwrap_or(""))
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl TextCompletion for GeminiClient {
    fn service(&self) -> &str {
        SERVICE
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            CitecastError::Configuration(
                "GEMINI_API_KEY is required for the Gemini provider".to_string(),
            )
        })?;

        let request = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.expose_secret())])
            .json(&request_body(prompt));

        let (status, payload) = send_json(SERVICE, request)
            .instrument(tracing::info_span!("llm.gemini", model = %self.model))
            .await?;

        response_text(&payload).ok_or_else(|| {
            CitecastError::external(
                SERVICE,
                Some(status.as_u16()),
                "Gemini response did not include text output",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretRef;

    fn config(api_key: SecretRef) -> ProviderConfig {
        ProviderConfig {
            api_key,
            ..ProviderConfig::gemini()
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("hello");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["temperature"], 0.2);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": " {\"a\":" }, { "text": "1} " }] } }]
        });
        assert_eq!(response_text(&payload).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_response_text_missing() {
        assert_eq!(response_text(&json!({})), None);
        assert_eq!(response_text(&json!({ "candidates": [] })), None);
        let blank = json!({ "candidates": [{ "content": { "parts": [{ "text": "  " }] } }] });
        assert_eq!(response_text(&blank), None);
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClient::new(&config(SecretRef::inline("k")), 1000).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = GeminiClient::new(&config(SecretRef::default()), 1000).unwrap();
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(err, CitecastError::Configuration(_)));
        assert!(!err.is_retriable());
    }
}

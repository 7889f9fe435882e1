use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::Instrument;

use crate::config::EnrichmentConfig;
use crate::error::{CitecastError, Result};
use crate::external::{doi_url, OpenAccessLookup, OpenAccessRecord};
use crate::http::{build_client, send_json};

const SERVICE: &str = "unpaywall";

pub struct UnpaywallClient {
    client: Client,
    base_url: String,
    email: Option<String>,
}

impl UnpaywallClient {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_millis(config.timeout_ms))?,
            base_url: config.unpaywall_base_url.clone(),
            email: config
                .unpaywall_email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        })
    }
}

#[async_trait]
impl OpenAccessLookup for UnpaywallClient {
    async fn find_by_doi(&self, doi: &str) -> Result<OpenAccessRecord> {
        let email = self.email.as_deref().ok_or_else(|| {
            CitecastError::Configuration(
                "UNPAYWALL_EMAIL is required for Unpaywall requests".to_string(),
            )
        })?;

        let url = doi_url(&self.base_url, doi)?;
        let request = self
            .client
            .get(url)
            .query(&[("email", email)])
            .header(ACCEPT, "application/json");

        let (_, payload) = send_json(SERVICE, request)
            .instrument(tracing::info_span!("lookup.unpaywall", doi = %doi))
            .await?;

        Ok(parse_record(&payload))
    }
}

pub fn parse_record(payload: &Value) -> OpenAccessRecord {
    let location = payload.get("best_oa_location");
    let pick = |key: &str| {
        location
            .and_then(|l| l.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    OpenAccessRecord {
        is_open_access: payload.get("is_oa").and_then(Value::as_bool).unwrap_or(false),
        oa_url: pick("url_for_pdf").or_else(|| pick("url")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefers_pdf_url() {
        let record = parse_record(&json!({
            "is_oa": true,
            "best_oa_location": { "url": "https://a.org", "url_for_pdf": "https://a.org/p.pdf" }
        }));
        assert!(record.is_open_access);
        assert_eq!(record.oa_url.as_deref(), Some("https://a.org/p.pdf"));
    }

    #[test]
    fn test_falls_back_to_landing_url() {
        let record = parse_record(&json!({
            "is_oa": true,
            "best_oa_location": { "url": "https://a.org", "url_for_pdf": "" }
        }));
        assert_eq!(record.oa_url.as_deref(), Some("https://a.org"));
    }

    #[test]
    fn test_closed_access() {
        let record = parse_record(&json!({ "is_oa": false, "best_oa_location": null }));
        assert_eq!(
            record,
            OpenAccessRecord {
                is_open_access: false,
                oa_url: None
            }
        );
    }

    #[tokio::test]
    async fn test_missing_email_is_configuration_error() {
        let config = EnrichmentConfig {
            unpaywall_email: Some("  ".into()),
            ..EnrichmentConfig::default()
        };
        let client = UnpaywallClient::new(&config).unwrap();
        let err = client.find_by_doi("10.1000/x").await.unwrap_err();
        assert!(matches!(err, CitecastError::Configuration(_)));
    }
}

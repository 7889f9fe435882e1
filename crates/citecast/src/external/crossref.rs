use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use tracing::Instrument;

use crate::config::EnrichmentConfig;
use crate::error::Result;
use crate::external::{doi_url, BibliographicLookup, CrossrefRecord};
use crate::http::{build_client, send_json};

const SERVICE: &str = "crossref";

pub struct CrossrefClient {
    client: Client,
    base_url: String,
}

impl CrossrefClient {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(Duration::from_millis(config.timeout_ms))?,
            base_url: config.crossref_base_url.clone(),
        })
    }
}

#[async_trait]
impl BibliographicLookup for CrossrefClient {
    async fn find_by_doi(&self, doi: &str) -> Result<CrossrefRecord> {
        let url = doi_url(&self.base_url, doi)?;
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json");

        let (_, payload) = send_json(SERVICE, request)
            .instrument(tracing::info_span!("lookup.crossref", doi = %doi))
            .await?;

        Ok(parse_record(&payload, doi))
    }
}

/// Normalizes a Crossref `works` response. Missing pieces become empty
/// values rather than errors.
pub fn parse_record(payload: &Value, requested_doi: &str) -> CrossrefRecord {
    let message = payload.get("message").unwrap_or(&Value::Null);

    CrossrefRecord {
        title: normalize_title(message.get("title")),
        authors: normalize_authors(message.get("author")),
        year: normalize_year(message.pointer("/issued/date-parts")),
        url: non_empty_str(message.get("URL")),
        doi: non_empty_str(message.get("DOI")).unwrap_or_else(|| requested_doi.to_string()),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn normalize_title(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => non_empty_str(items.first()),
        other => non_empty_str(other),
    }
    .unwrap_or_default()
}

fn normalize_authors(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(authors)) = value else {
        return Vec::new();
    };

    authors
        .iter()
        .filter_map(|author| {
            if let Some(name) = non_empty_str(author.get("name")) {
                return Some(name);
            }
            let given = author.get("given").and_then(Value::as_str).unwrap_or("");
            let family = author.get("family").and_then(Value::as_str).unwrap_or("");
            let full = format!("{} {}", given, family).trim().to_string();
            (!full.is_empty()).then_some(full)
        })
        .collect()
}

fn normalize_year(value: Option<&Value>) -> Option<i32> {
    value?
        .get(0)?
        .get(0)?
        .as_i64()
        .and_then(|year| i32::try_from(year).ok())
}

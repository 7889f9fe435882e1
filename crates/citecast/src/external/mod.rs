//! Bibliographic lookups by DOI.

pub mod crossref;
pub mod unpaywall;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use crossref::CrossrefClient;
pub use unpaywall::UnpaywallClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossrefRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
    pub doi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccessRecord {
    pub is_open_access: bool,
    pub oa_url: Option<String>,
}

#[async_trait]
pub trait BibliographicLookup: Send + Sync {
    async fn find_by_doi(&self, doi: &str) -> Result<CrossrefRecord>;
}

#[async_trait]
pub trait OpenAccessLookup: Send + Sync {
    async fn find_by_doi(&self, doi: &str) -> Result<OpenAccessRecord>;
}

/// Appends `doi` to `base` as one percent-encoded path segment.
pub(crate) fn doi_url(base: &str, doi: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base).map_err(|e| {
        crate::error::CitecastError::Configuration(format!("Invalid lookup URL '{}': {}", base, e))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            crate::error::CitecastError::Configuration(format!(
                "Lookup URL '{}' cannot take a path",
                base
            ))
        })?
        .pop_if_empty()
        .push(doi.trim());
    Ok(url)
}

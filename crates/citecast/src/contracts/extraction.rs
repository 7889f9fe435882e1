use std::sync::LazyLock;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{compile_schema, validate_against, ValidationIssues};

const EXTRACTION_SCHEMA_JSON: &str = include_str!("../../../../schema/extraction-v1.json");

static EXTRACTION_SCHEMA: LazyLock<Result<Validator, String>> =
    LazyLock::new(|| compile_schema(EXTRACTION_SCHEMA_JSON));

/// Structured claims pulled out of one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Extraction {
    pub claims: Vec<String>,
    pub population: String,
    pub intervention: String,
    pub outcomes: String,
    pub limitations: String,
    pub evidence_level: String,
    pub confidence_score: f64,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Citation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub source_used: bool,
}

/// Validates a decoded extraction payload, returning the typed value or every
/// issue found.
pub fn validate_extraction(value: &Value) -> Result<Extraction, ValidationIssues> {
    validate_against(&EXTRACTION_SCHEMA, value)
}

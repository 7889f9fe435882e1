use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{CitecastError, Result};
use crate::sanitize::truncate_chars;

static RE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)\s*```").unwrap());

/// Characters of undecodable output kept as error details.
const MAX_DETAILS_CHARS: usize = 1000;

/// Trims `raw` and unwraps the first markdown code fence, if any.
pub fn extract_json_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Some(body) = RE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .filter(|m| !m.as_str().is_empty())
    {
        return body.as_str().trim().to_string();
    }

    trimmed.to_string()
}

/// Decodes provider output as JSON, tolerating a surrounding code fence.
pub fn parse_json(raw: &str, provider: &str) -> Result<Value> {
    let json_text = extract_json_text(raw);

    serde_json::from_str(&json_text).map_err(|_| CitecastError::ResponseValidation {
        provider: provider.to_string(),
        message: format!("{} returned non-JSON output", provider),
        details: truncate_chars(&json_text, MAX_DETAILS_CHARS),
    })
}

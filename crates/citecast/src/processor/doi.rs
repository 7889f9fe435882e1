use std::sync::LazyLock;

use regex::Regex;

static RE_DOI_IN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b10\.\d{4,9}/[-._;()/:A-Z0-9]+\b").unwrap());
static RE_TRAILING_PUNCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[).,;]+$").unwrap());

/// Every DOI mentioned in `text`, lowercased and deduplicated in the order
/// first seen.
pub fn extract_dois(text: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();

    for m in RE_DOI_IN_TEXT.find_iter(text) {
        let doi = RE_TRAILING_PUNCT.replace(m.as_str(), "").to_lowercase();
        if !doi.is_empty() && !seen.contains(&doi) {
            seen.push(doi);
        }
    }

    seen
}

/// First DOI found in `text`.
pub fn detect_doi(text: &str) -> Option<String> {
    extract_dois(text).into_iter().next()
}

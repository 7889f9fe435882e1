//! Decides how much of a paper may be forwarded to an external LLM.

use crate::config::LimitsConfig;
use crate::sanitize::truncate_chars;

/// Builds the text sent upstream for extraction.
///
/// Only an affirmatively open-access paper may have its full body forwarded.
/// Otherwise the abstract is used, or a short leading snippet when there is
/// no abstract. Both paths are capped at `max_llm_input_chars`.
pub fn build_text_for_llm(
    full_text: &str,
    abstract_text: Option<&str>,
    is_open_access: Option<bool>,
    limits: &LimitsConfig,
) -> String {
    let full = full_text.trim();
    let abstract_text = abstract_text.map(str::trim).filter(|a| !a.is_empty());

    if is_open_access != Some(true) {
        let safe = match abstract_text {
            Some(a) => a.to_string(),
            None => truncate_chars(full, limits.safe_snippet_chars),
        };
        return truncate_chars(&safe, limits.max_llm_input_chars);
    }

    truncate_chars(full, limits.max_llm_input_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn test_closed_access_prefers_abstract() {
        let body = "B".repeat(20_000);
        let text = build_text_for_llm(&body, Some("  The abstract.  "), Some(false), &limits());
        assert_eq!(text, "The abstract.");
    }

    #[test]
    fn test_unknown_access_without_abstract_uses_snippet() {
        let body = format!("   {}", "é".repeat(5_000));
        let text = build_text_for_llm(&body, None, None, &limits());
        assert_eq!(text.chars().count(), 2_500);
        assert!(text.starts_with('é'));
    }

    #[test]
    fn test_blank_abstract_counts_as_missing() {
        let text = build_text_for_llm("Body text", Some("   "), Some(false), &limits());
        assert_eq!(text, "Body text");
    }

    #[test]
    fn test_long_abstract_is_capped() {
        let abstract_text = "a".repeat(13_000);
        let text = build_text_for_llm("body", Some(&abstract_text), None, &limits());
        assert_eq!(text.len(), 12_000);
    }

    #[test]
    fn test_open_access_sends_capped_full_text() {
        let body = "F".repeat(15_000);
        let text = build_text_for_llm(&body, Some("abstract"), Some(true), &limits());
        assert_eq!(text.len(), 12_000);
        assert!(text.chars().all(|c| c == 'F'));
    }

    #[test]
    fn test_custom_limits() {
        let limits = LimitsConfig {
            max_llm_input_chars: 10,
            safe_snippet_chars: 4,
            abstract_max_chars: 4,
        };
        assert_eq!(build_text_for_llm("abcdefgh", None, None, &limits), "abcd");
        assert_eq!(
            build_text_for_llm("abcdefghijklmnop", None, Some(true), &limits),
            "abcdefghij"
        );
    }
}

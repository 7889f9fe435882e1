use std::sync::LazyLock;

use regex::Regex;

static RE_TRAILING_BLANKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+\n").unwrap());
static RE_BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_ABSTRACT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|\n)\s*(?:abstract|resumen)\s*:?\s*").unwrap());
static RE_ABSTRACT_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\n)\s*(?:\d+\s*(?:[.)]\s*)?)?(?:introduction|introduccion|introducción)\b")
        .unwrap()
});

/// Drops carriage returns and trailing blanks, collapses runs of three or
/// more newlines into one blank line, then trims.
pub fn normalize_text(value: &str) -> String {
    let without_cr = value.replace('\r', "");
    let without_trailing = RE_TRAILING_BLANKS.replace_all(&without_cr, "\n");
    RE_BLANK_RUNS
        .replace_all(&without_trailing, "\n\n")
        .trim()
        .to_string()
}

/// Finds the text between an "Abstract"/"Resumen" heading and the
/// introduction heading, capped at `max_chars` characters.
///
/// Without an introduction heading the excerpt simply runs to the cap.
pub fn extract_abstract(text: &str, max_chars: usize) -> Option<String> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return None;
    }

    let start = RE_ABSTRACT_START.find(&normalized)?.end();
    let after_start = &normalized[start..];

    let end = RE_ABSTRACT_END
        .find(after_start)
        .map(|m| m.start())
        .unwrap_or(after_start.len());
    let section = &after_start[..end];

    let capped = match section.char_indices().nth(max_chars) {
        Some((idx, _)) => &section[..idx],
        None => section,
    };

    let excerpt = capped.trim();
    if excerpt.is_empty() {
        None
    } else {
        Some(excerpt.to_string())
    }
}

//! Helpers for keeping logs and persisted messages small and free of
//! local paths or upstream payload dumps.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Truncates `value` to at most `max_chars` characters, never splitting a
/// UTF-8 sequence.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// Shortens an upstream response body before it goes into a log line.
pub fn sanitize_body(body: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(body, max_chars);
    if truncated.len() < body.len() {
        format!("{}... (truncated)", truncated)
    } else {
        truncated
    }
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

//! HTML templates for post variant exports.
//!
//! Templates are plain minijinja sources under `assets/`. Auto-escaping is off;
//! every interpolation goes through the `escape_html` filter instead, which
//! produces the exact entity set the rendered pages expect.

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use serde_json::Value;

use crate::error::{CitecastError, Result};

const NO_CITATIONS: &str = "No citation metadata available.";
const MAX_SUMMARY_TITLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    CarouselBasic,
    MythVsFact,
    ClinicalSummary,
}

impl TemplateId {
    pub const ALL: [TemplateId; 3] = [
        TemplateId::CarouselBasic,
        TemplateId::MythVsFact,
        TemplateId::ClinicalSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::CarouselBasic => "carousel_basic",
            TemplateId::MythVsFact => "myth_vs_fact",
            TemplateId::ClinicalSummary => "clinical_summary",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    fn source(&self) -> &'static str {
        match self {
            TemplateId::CarouselBasic => include_str!("assets/carousel_basic.html"),
            TemplateId::MythVsFact => include_str!("assets/myth_vs_fact.html"),
            TemplateId::ClinicalSummary => include_str!("assets/clinical_summary.html"),
        }
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values every template renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateData {
    pub platform: String,
    pub content_text: String,
    pub citation_summary: String,
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Shortens `value` to `max` characters, ending with "..." when cut.
fn clip(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let kept: String = value.chars().take(max.saturating_sub(1)).collect();
        format!("{}...", kept)
    } else {
        value.to_string()
    }
}

/// "Sources: a | b | c" from the first three non-blank citation titles.
pub fn summarize_citations(citations: &Value) -> String {
    let Some(entries) = citations.as_array() else {
        return NO_CITATIONS.to_string();
    };

    let titles: Vec<&str> = entries
        .iter()
        .filter_map(|entry| entry.get("title").and_then(Value::as_str))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .take(MAX_SUMMARY_TITLES)
        .collect();

    if titles.is_empty() {
        NO_CITATIONS.to_string()
    } else {
        format!("Sources: {}", titles.join(" | "))
    }
}

fn environment() -> std::result::Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_filter("escape_html", |value: String| escape_html(&value));
    env.add_filter("clip", |value: String, max: usize| clip(&value, max));
    for template in TemplateId::ALL {
        env.add_template(template.as_str(), template.source())?;
    }
    Ok(env)
}

/// Renders one template to a self-contained HTML page.
pub fn render(template: TemplateId, data: &TemplateData) -> Result<String> {
    let render_error = |e: minijinja::Error| CitecastError::Application {
        message: format!("Failed to render template {}: {}", template, e),
        source: Some(Box::new(e)),
    };

    let env = environment().map_err(render_error)?;
    env.get_template(template.as_str())
        .and_then(|t| t.render(data))
        .map_err(render_error)
}

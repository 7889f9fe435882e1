use crate::contracts::Platform;
use crate::llm::{ExtractClaimsInput, GeneratePostsInput};

const STRICT_JSON_LINE: &str = "Return ONLY strict JSON, no markdown, no commentary, no code fences.";

const EXTRACTION_JSON_SHAPE: &str = r#"{
  "claims": ["string", "string", "string"],
  "population": "string",
  "intervention": "string",
  "outcomes": "string",
  "limitations": "string",
  "evidenceLevel": "string",
  "confidenceScore": 0.0,
  "citations": [
    {
      "title": "string",
      "doi": "10.xxxx/...",
      "url": "https://...",
      "year": 2024,
      "sourceUsed": true
    }
  ]
}"#;

const POSTS_JSON_SHAPE: &str = r##"{
  "posts": [
    {
      "platform": "linkedin|x|threads|bluesky",
      "contentText": "string",
      "hashtags": ["#tag1", "#tag2"],
      "citationBlock": "string"
    }
  ]
}"##;

const DEFAULT_AUDIENCE: &str = "general professional audience";

pub fn build_extraction_prompt(input: &ExtractClaimsInput) -> String {
    [
        "Extract structured scientific claims from the source text.".to_string(),
        STRICT_JSON_LINE.to_string(),
        "Follow this JSON shape exactly:".to_string(),
        EXTRACTION_JSON_SHAPE.to_string(),
        format!("DOI (if present): {}", input.doi.as_deref().unwrap_or("unknown")),
        format!(
            "Abstract: {}",
            input.abstract_text.as_deref().unwrap_or("not provided")
        ),
        format!("Document text:\n{}", input.document_text),
    ]
    .join("\n\n")
}

pub fn build_post_generation_prompt(input: &GeneratePostsInput) -> String {
    let platforms: Vec<&str> = match &input.preferred_platforms {
        Some(list) => list.iter().map(Platform::as_str).collect(),
        None => Platform::ALL.iter().map(Platform::as_str).collect(),
    };
    let extraction_json = serde_json::to_string(&input.extraction).unwrap_or_default();

    [
        "Generate social post variants from the extraction.".to_string(),
        STRICT_JSON_LINE.to_string(),
        "Use the exact shape below. The top-level key must be `posts`.".to_string(),
        POSTS_JSON_SHAPE.to_string(),
        format!(
            "Audience: {}",
            input.audience.as_deref().unwrap_or(DEFAULT_AUDIENCE)
        ),
        format!("Preferred platforms: {}", platforms.join(", ")),
        format!("Extraction JSON:\n{}", extraction_json),
    ]
    .join("\n\n")
}

pub fn build_repair_prompt(raw_output: &str, validation_errors: &str) -> String {
    [
        "Repair the JSON output so it becomes valid.",
        "Return ONLY repaired JSON, no markdown, no commentary, no code fences.",
        "Validation errors:",
        validation_errors,
        "Invalid JSON/output:",
        raw_output,
    ]
    .join("\n\n")
}

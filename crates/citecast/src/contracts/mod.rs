//! Structural contracts for LLM responses.
//!
//! Each contract is an embedded JSON schema. Validation collects every
//! schema error (instance path + message) instead of stopping at the first
//! one, so the repair prompt can list them all. Only a value that passes the
//! schema is deserialized into the typed result.

pub mod extraction;
pub mod post;

use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub use extraction::{validate_extraction, Citation, Extraction};
pub use post::{validate_post_variants, Platform, PostVariant};

/// One contract violation at a JSON pointer such as `/citations/0/doi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

/// All issues found in one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Machine-readable form embedded into repair prompts.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

impl std::fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|i| format!("{}: {}", display_path(&i.path), i.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// Compiles an embedded schema with `format` checks switched on. A broken
/// schema comes back as `Err` and surfaces as a validation issue.
pub(crate) fn compile_schema(source: &str) -> Result<Validator, String> {
    let schema: Value = serde_json::from_str(source)
        .map_err(|e| format!("Invalid embedded schema JSON: {}", e))?;
    jsonschema::options()
        .should_validate_formats(true)
        .build(&schema)
        .map_err(|e| format!("Failed to compile JSON schema: {}", e))
}

/// Checks `value` against `schema`, then deserializes it.
pub(crate) fn validate_against<T: DeserializeOwned>(
    schema: &Result<Validator, String>,
    value: &Value,
) -> Result<T, ValidationIssues> {
    let mut issues = ValidationIssues::default();

    match schema {
        Ok(validator) => {
            for error in validator.iter_errors(value) {
                issues.push(error.instance_path.to_string(), error.to_string());
            }
        }
        Err(message) => issues.push("", message.clone()),
    }

    if !issues.is_empty() {
        return Err(issues);
    }

    serde_json::from_value(value.clone()).map_err(|e| {
        let mut issues = ValidationIssues::default();
        issues.push("", e.to_string());
        issues
    })
}

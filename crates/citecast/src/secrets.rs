//! Secret resolution for provider API keys.
//!
//! A [`SecretRef`] names where a key lives. Sources are tried in order:
//!
//! 1. **Inline value** (`"value": "..."`), handy for local experiments
//! 2. **File** (`"file": "/run/secrets/gemini"`), the Docker secrets pattern
//! 3. **Environment variable** (`"envVar": "GEMINI_API_KEY"`)
//!
//! An unset variable is "no secret", not an error. The provider adapters turn
//! a missing key into a configuration error at call time.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Failed to read secret from file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

impl SecretRef {
    pub fn from_env_var(name: &str) -> Self {
        Self {
            env_var: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn inline(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            ..Self::default()
        }
    }

    /// Resolves the secret, or `None` when no source yields a non-empty value.
    pub fn resolve(&self) -> Result<Option<SecretString>> {
        if let Some(value) = non_empty(self.value.as_deref()) {
            return Ok(Some(SecretString::from(value.to_string())));
        }

        if let Some(path) = non_empty(self.file.as_deref()) {
            let expanded = expand_home(path);
            let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileRead {
                path: expanded.clone(),
                source: e,
            })?;
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                return Ok(Some(SecretString::from(trimmed.to_string())));
            }
        }

        if let Some(name) = non_empty(self.env_var.as_deref()) {
            match std::env::var(name) {
                Ok(value) => {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Ok(Some(SecretString::from(trimmed.to_string())));
                    }
                }
                Err(std::env::VarError::NotPresent) => {}
                Err(std::env::VarError::NotUnicode(_)) => {
                    return Err(SecretError::EnvVarNotUnicode {
                        name: name.to_string(),
                    })
                }
            }
        }

        Ok(None)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Expands a leading `~` using HOME (or USERPROFILE on Windows).
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::export::TemplateId;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: Config = serde_json::from_value(json_value)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
        .map_err(|e| validation(format!("Invalid embedded schema JSON: {}", e)))?;

    let validator = jsonschema::options()
        .should_validate_formats(true)
        .build(&schema)
        .map_err(|e| validation(format!("Failed to compile JSON schema: {}", e)))?;

    let errors: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();
    if !errors.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: errors.join("; "),
        });
    }

    Ok(())
}

/// Defaults plus environment overrides, for running without a config file.
pub fn config_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Applies `GEMINI_MODEL`, `GROQ_MODEL`, `UNPAYWALL_EMAIL`, `CITECAST_DB`,
/// `CITECAST_STORAGE` and `LOG_LEVEL` when set and non-empty.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(model) = env_value("GEMINI_MODEL") {
        config.llm.gemini.model = model;
    }
    if let Some(model) = env_value("GROQ_MODEL") {
        config.llm.groq.model = model;
    }
    if let Some(email) = env_value("UNPAYWALL_EMAIL") {
        config.enrichment.unpaywall_email = Some(email);
    }
    if let Some(db) = env_value("CITECAST_DB") {
        config.database_path = Some(PathBuf::from(db));
    }
    if let Some(storage) = env_value("CITECAST_STORAGE") {
        config.storage_directory = PathBuf::from(storage);
    }
    if let Some(level) = env_value("LOG_LEVEL") {
        config.logging.level = level;
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Cross-field rules, and values that reach the config from the environment
/// without passing through the schema.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (name, provider) in [("gemini", &config.llm.gemini), ("groq", &config.llm.groq)] {
        if provider.model.trim().is_empty() {
            return Err(validation(format!("llm.{}.model must not be empty", name)));
        }
        if provider.base_url.trim().is_empty() {
            return Err(validation(format!("llm.{}.baseUrl must not be empty", name)));
        }
    }

    let limits = &config.limits;
    if limits.safe_snippet_chars > limits.max_llm_input_chars {
        return Err(validation(
            "limits.safeSnippetChars must not exceed limits.maxLlmInputChars",
        ));
    }

    if TemplateId::parse(&config.export.template_id).is_none() {
        return Err(validation(format!(
            "Unknown export template: {}",
            config.export.template_id
        )));
    }

    Ok(())
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.llm.timeout_ms, 20_000);
        assert_eq!(config.llm.primary_backoff_ms, vec![500, 1500]);
        assert_eq!(config.limits.max_llm_input_chars, 12_000);
        assert_eq!(config.limits.safe_snippet_chars, 2_500);
        assert_eq!(config.export.template_id, "carousel_basic");
        assert_eq!(
            config.llm.gemini.api_key.env_var.as_deref(),
            Some("GEMINI_API_KEY")
        );
    }

    #[test]
    #[serial]
    fn test_full_config_parses() {
        let json = r#"{
            "databasePath": "/tmp/citecast.db",
            "storageDirectory": "/tmp/storage",
            "logging": { "level": "debug", "format": "json" },
            "llm": {
                "timeoutMs": 5000,
                "primaryBackoffMs": [100],
                "gemini": { "model": "gemini-2.0-flash", "baseUrl": "http://localhost:1", "apiKey": { "value": "k" } },
                "groq": { "model": "llama", "baseUrl": "http://localhost:2" }
            },
            "enrichment": { "unpaywallEmail": "me@example.org" },
            "limits": { "maxLlmInputChars": 8000, "safeSnippetChars": 1000, "abstractMaxChars": 900 },
            "export": { "enabled": false, "templateId": "myth_vs_fact" }
        }"#;
        std::env::remove_var("LOG_LEVEL");
        let config = load_config_from_str(json).unwrap();
        assert_eq!(config.llm.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.llm.primary_backoff_ms, vec![100]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.enrichment.unpaywall_email.as_deref(), Some("me@example.org"));
        assert!(!config.export.enabled);
        assert_eq!(config.pdf_directory(), PathBuf::from("/tmp/storage/pdfs"));
    }

    #[test]
    #[serial]
    fn test_rejects_zero_timeout() {
        let err = load_config_from_str(r#"{"llm": {"timeoutMs": 0}}"#).unwrap_err();
        match err {
            ConfigError::SchemaValidation { errors } => assert!(errors.contains("/llm/timeoutMs")),
            other => panic!("expected schema error, got {other}"),
        }
    }

    #[test]
    #[serial]
    fn test_rejects_unknown_keys() {
        let err = load_config_from_str(r#"{"llm": {"temperature": 0.9}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    #[serial]
    fn test_rejects_wrong_types_and_bad_urls() {
        let err = load_config_from_str(
            r#"{
                "logging": { "format": "xml" },
                "enrichment": { "crossrefBaseUrl": "not a url" },
                "llm": { "groq": { "model": "llama" } }
            }"#,
        )
        .unwrap_err();
        let ConfigError::SchemaValidation { errors } = err else {
            panic!("expected schema error");
        };
        assert!(errors.contains("/logging/format"));
        assert!(errors.contains("/enrichment/crossrefBaseUrl"));
        assert!(errors.contains("baseUrl"));
    }

    #[test]
    #[serial]
    fn test_blank_env_override_is_ignored() {
        std::env::set_var("GEMINI_MODEL", " ");
        let config = load_config_from_str("{}").unwrap();
        std::env::remove_var("GEMINI_MODEL");
        assert_eq!(config.llm.gemini.model, crate::config::schema::DEFAULT_GEMINI_MODEL);
    }

    #[test]
    #[serial]
    fn test_rejects_snippet_larger_than_cap() {
        let err = load_config_from_str(
            r#"{"limits": {"maxLlmInputChars": 100, "safeSnippetChars": 200}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("safeSnippetChars"));
    }

    #[test]
    #[serial]
    fn test_rejects_unknown_template() {
        let err = load_config_from_str(r#"{"export": {"templateId": "poster"}}"#).unwrap_err();
        assert!(err.to_string().contains("poster"));
    }

    #[test]
    #[serial]
    fn test_rejects_huge_backoff() {
        let err =
            load_config_from_str(r#"{"llm": {"primaryBackoffMs": [500, 120000]}}"#).unwrap_err();
        assert!(err.to_string().contains("/llm/primaryBackoffMs/1"));
    }

    #[test]
    #[serial]
    fn test_invalid_json() {
        let err = load_config_from_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("GROQ_MODEL", "mixtral");
        std::env::set_var("UNPAYWALL_EMAIL", "lab@example.org");
        let config = load_config_from_str("{}").unwrap();
        std::env::remove_var("GROQ_MODEL");
        std::env::remove_var("UNPAYWALL_EMAIL");

        assert_eq!(config.llm.groq.model, "mixtral");
        assert_eq!(
            config.enrichment.unpaywall_email.as_deref(),
            Some("lab@example.org")
        );
    }

    #[test]
    #[serial]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"storageDirectory": "data"}}"#).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.storage_directory, PathBuf::from("data"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/no/such/citecast.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}

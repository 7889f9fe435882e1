use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::secrets::SecretRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_storage_directory")]
    pub storage_directory: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_storage_directory() -> PathBuf {
    PathBuf::from("storage")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            storage_directory: default_storage_directory(),
            logging: LoggingConfig::default(),
            llm: LlmConfig::default(),
            enrichment: EnrichmentConfig::default(),
            limits: LimitsConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Database location: the configured path, else `~/.citecast/data/citecast.db`.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
    }

    pub fn pdf_directory(&self) -> PathBuf {
        self.storage_directory.join("pdfs")
    }

    pub fn export_directory(&self) -> PathBuf {
        self.storage_directory.join("exports")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_primary_backoff_ms")]
    pub primary_backoff_ms: Vec<u64>,
    #[serde(default = "ProviderConfig::gemini")]
    pub gemini: ProviderConfig,
    #[serde(default = "ProviderConfig::groq")]
    pub groq: ProviderConfig,
}

fn default_llm_timeout_ms() -> u64 {
    20_000
}

fn default_primary_backoff_ms() -> Vec<u64> {
    vec![500, 1500]
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_llm_timeout_ms(),
            primary_backoff_ms: default_primary_backoff_ms(),
            gemini: ProviderConfig::gemini(),
            groq: ProviderConfig::groq(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub model: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: SecretRef,
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

impl ProviderConfig {
    pub fn gemini() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key: SecretRef::from_env_var("GEMINI_API_KEY"),
        }
    }

    pub fn groq() -> Self {
        Self {
            model: DEFAULT_GROQ_MODEL.to_string(),
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            api_key: SecretRef::from_env_var("GROQ_API_KEY"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentConfig {
    #[serde(default = "default_crossref_base_url")]
    pub crossref_base_url: String,
    #[serde(default = "default_unpaywall_base_url")]
    pub unpaywall_base_url: String,
    #[serde(default)]
    pub unpaywall_email: Option<String>,
    #[serde(default = "default_enrichment_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_crossref_base_url() -> String {
    "https://api.crossref.org/works".to_string()
}

fn default_unpaywall_base_url() -> String {
    "https://api.unpaywall.org/v2".to_string()
}

fn default_enrichment_timeout_ms() -> u64 {
    15_000
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            crossref_base_url: default_crossref_base_url(),
            unpaywall_base_url: default_unpaywall_base_url(),
            unpaywall_email: None,
            timeout_ms: default_enrichment_timeout_ms(),
        }
    }
}

/// Character budgets for text forwarded to the LLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfig {
    #[serde(default = "default_max_llm_input_chars")]
    pub max_llm_input_chars: usize,
    #[serde(default = "default_safe_snippet_chars")]
    pub safe_snippet_chars: usize,
    #[serde(default = "default_abstract_max_chars")]
    pub abstract_max_chars: usize,
}

fn default_max_llm_input_chars() -> usize {
    12_000
}

fn default_safe_snippet_chars() -> usize {
    2_500
}

fn default_abstract_max_chars() -> usize {
    2_500
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_llm_input_chars: default_max_llm_input_chars(),
            safe_snippet_chars: default_safe_snippet_chars(),
            abstract_max_chars: default_abstract_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_template_id")]
    pub template_id: String,
}

fn default_true() -> bool {
    true
}

fn default_template_id() -> String {
    "carousel_basic".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            template_id: default_template_id(),
        }
    }
}

use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the pipeline, the LLM layer and the lookups can surface.
///
/// Callers match on the variant instead of inspecting messages. `code()` and
/// `http_status()` give the stable mapping an outer transport layer can use.
#[derive(Error, Debug)]
pub enum CitecastError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{message}")]
    ExternalService {
        service: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{service} rate limit exceeded")]
    RateLimit {
        service: String,
        retry_after_seconds: Option<u64>,
    },

    #[error("{message}")]
    ResponseValidation {
        provider: String,
        message: String,
        details: String,
    },

    #[error("LLM_UNAVAILABLE")]
    Unavailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Document {document_id} is already being processed")]
    AlreadyProcessing { document_id: String },

    #[error("{message}")]
    Application {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Coarse outcome class for whoever turns errors into responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    NotFound,
    Server,
}

impl CitecastError {
    pub fn application(message: impl Into<String>) -> Self {
        CitecastError::Application {
            message: message.into(),
            source: None,
        }
    }

    pub fn external(service: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        CitecastError::ExternalService {
            service: service.to_string(),
            status,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CitecastError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// HTTP-style status carried from upstream, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CitecastError::RateLimit { .. } => Some(429),
            CitecastError::ExternalService { status, .. } => *status,
            _ => None,
        }
    }

    /// Retriable iff the upstream status is 429 or a 5xx.
    pub fn is_retriable(&self) -> bool {
        matches!(self.status(), Some(429) | Some(500..=599))
    }

    pub fn code(&self) -> &'static str {
        match self {
            CitecastError::Configuration(_) => "CONFIGURATION_ERROR",
            CitecastError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            CitecastError::RateLimit { .. } => "RATE_LIMITED",
            CitecastError::ResponseValidation { .. } => "LLM_INVALID_OUTPUT",
            CitecastError::Unavailable => "LLM_UNAVAILABLE",
            CitecastError::InvalidInput(_) => "VALIDATION_ERROR",
            CitecastError::NotFound { .. } => "NOT_FOUND",
            CitecastError::AlreadyProcessing { .. } => "ALREADY_PROCESSING",
            CitecastError::Application { .. } => "APP_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            CitecastError::Configuration(_) => 500,
            CitecastError::ExternalService { .. } => 502,
            CitecastError::RateLimit { .. } => 429,
            CitecastError::ResponseValidation { .. } => 502,
            CitecastError::Unavailable => 503,
            CitecastError::InvalidInput(_) => 400,
            CitecastError::NotFound { .. } => 404,
            CitecastError::AlreadyProcessing { .. } => 409,
            CitecastError::Application { .. } => 500,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.http_status() {
            404 => ErrorClass::NotFound,
            400..=499 => ErrorClass::Client,
            _ => ErrorClass::Server,
        }
    }
}

impl From<crate::db::DatabaseError> for CitecastError {
    fn from(e: crate::db::DatabaseError) -> Self {
        CitecastError::Application {
            message: format!("Database error: {}", e),
            source: Some(Box::new(e)),
        }
    }
}

impl From<ProcessError> for CitecastError {
    fn from(e: ProcessError) -> Self {
        CitecastError::Application {
            message: format!("Processing error: {}", e),
            source: Some(Box::new(e)),
        }
    }
}

impl From<StorageError> for CitecastError {
    fn from(e: StorageError) -> Self {
        CitecastError::Application {
            message: format!("Storage error: {}", e),
            source: Some(Box::new(e)),
        }
    }
}

impl From<ConfigError> for CitecastError {
    fn from(e: ConfigError) -> Self {
        CitecastError::Configuration(e.to_string())
    }
}

impl From<crate::secrets::SecretError> for CitecastError {
    fn from(e: crate::secrets::SecretError) -> Self {
        CitecastError::Configuration(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CitecastError>;

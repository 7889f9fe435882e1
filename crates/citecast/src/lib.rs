pub mod config;
pub mod contracts;
pub mod db;
pub mod error;
pub mod export;
pub mod external;
pub mod http;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod secrets;
pub mod storage;

pub use config::{load_config, Config};
pub use db::Database;
pub use error::{CitecastError, ConfigError, ProcessError, Result, StorageError};
pub use export::{Exporter, HtmlExporter, TemplateId};
pub use llm::{LlmProvider, LlmRouter};
pub use pipeline::{Pipeline, PipelineServices, Stage};
pub use secrets::SecretError;
pub use storage::FileStorage;

//! Rendering of generated posts into shareable artifacts.

pub mod html;
pub mod templates;

use async_trait::async_trait;

use crate::db::export_repo::ExportRow;
use crate::error::Result;

pub use html::HtmlExporter;
pub use templates::{escape_html, render, summarize_citations, TemplateData, TemplateId};

/// Final pipeline stage: turn a document's post variants into artifacts.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export_document(&self, document_id: &str) -> Result<Vec<ExportRow>>;
}

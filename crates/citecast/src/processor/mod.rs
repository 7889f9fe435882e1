pub mod doi;
pub mod pdf;
pub mod text;

use crate::error::ProcessError;

pub use doi::{detect_doi, extract_dois};
pub use pdf::LopdfExtractor;
pub use text::{extract_abstract, normalize_text};

/// Text pulled out of a stored PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPdf {
    /// Normalized full text.
    pub text: String,
    /// Abstract excerpt, when the text has a recognizable abstract heading.
    pub abstract_text: Option<String>,
}

pub trait PdfTextExtractor: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedPdf, ProcessError>;
}

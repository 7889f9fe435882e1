use crate::error::ProcessError;
use crate::processor::text::{extract_abstract, normalize_text};
use crate::processor::{ParsedPdf, PdfTextExtractor};

/// Pulls embedded text out of a PDF with lopdf, page by page.
pub struct LopdfExtractor {
    abstract_max_chars: usize,
}

impl LopdfExtractor {
    pub fn new(abstract_max_chars: usize) -> Self {
        Self { abstract_max_chars }
    }
}

impl PdfTextExtractor for LopdfExtractor {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedPdf, ProcessError> {
        let _span = tracing::info_span!("processor.pdf", bytes = bytes.len()).entered();

        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        let raw = extract_text_from_pdf(&doc);
        let text = normalize_text(&raw);
        if text.is_empty() {
            tracing::warn!("PDF has {} page(s) but no extractable text", doc.get_pages().len());
        }
        let abstract_text = extract_abstract(&text, self.abstract_max_chars);

        Ok(ParsedPdf {
            text,
            abstract_text,
        })
    }
}

fn extract_text_from_pdf(doc: &lopdf::Document) -> String {
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => tracing::debug!("Skipping page {}: {}", page_num, e),
        }
    }

    text
}

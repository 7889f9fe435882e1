/// Output of PARSE_PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub text: String,
    pub abstract_text: Option<String>,
    pub detected_doi: Option<String>,
}

/// Output of METADATA_ENRICH. `is_open_access` stays `None` when neither the
/// lookup nor stored metadata says anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub doi: Option<String>,
    pub is_open_access: Option<bool>,
}

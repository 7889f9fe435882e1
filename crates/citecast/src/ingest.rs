//! Upload intake and read-side queries over stored documents.

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::document_repo::{self, DocumentRow};
use crate::db::export_repo::{self, ExportRow};
use crate::db::extraction_repo::{self, ExtractionRow};
use crate::db::job_run_repo::{self, JobRunRow};
use crate::db::metadata_repo::{self, MetadataRow};
use crate::db::post_variant_repo::{self, PostVariantRow};
use crate::db::{now_rfc3339, Database};
use crate::error::{CitecastError, Result};
use crate::pipeline::DocumentStatus;
use crate::sanitize;
use crate::storage::FileStorage;

const PDF_DIRECTORY: &str = "pdfs";
const PDF_MAGIC: &[u8] = b"%PDF-";
const DOCUMENT_LIST_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatusView {
    pub document: DocumentRow,
    pub job_runs: Vec<JobRunRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithExports {
    #[serde(flatten)]
    pub post: PostVariantRow,
    pub exports: Vec<ExportRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResults {
    pub document: DocumentRow,
    pub metadata: Option<MetadataRow>,
    pub extraction: Option<ExtractionRow>,
    pub posts: Vec<PostWithExports>,
}

/// Hex-encoded SHA-256 of `bytes`, lowercase.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn looks_like_pdf(filename: &str, bytes: &[u8]) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf") || bytes.starts_with(PDF_MAGIC)
}

/// Stores an uploaded PDF and records it as a PENDING document.
pub async fn ingest_pdf(
    db: &Database,
    storage: &FileStorage,
    filename: &str,
    bytes: &[u8],
) -> Result<DocumentRow> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(CitecastError::InvalidInput("Filename is required".to_string()));
    }
    if bytes.is_empty() {
        return Err(CitecastError::InvalidInput("Uploaded file is empty".to_string()));
    }
    if !looks_like_pdf(filename, bytes) {
        return Err(CitecastError::InvalidInput(format!(
            "Only PDF uploads are supported: {}",
            filename
        )));
    }

    let id = Uuid::new_v4().to_string();
    let sha256 = sha256_hex(bytes);
    let stored_name = format!("{}-{}", id, sanitize::sanitize_file_name(filename));
    let path = storage.store(PDF_DIRECTORY, &stored_name, bytes).await?;

    let now = now_rfc3339();
    let document = DocumentRow {
        id,
        original_filename: filename.to_string(),
        storage_path: path.to_string_lossy().into_owned(),
        sha256,
        status: DocumentStatus::Pending.as_str().to_string(),
        created_at: now.clone(),
        updated_at: now,
    };
    document_repo::insert(db, &document)?;

    log::info!(
        "Ingested {} as document {} ({} bytes)",
        sanitize::redact_path(&path),
        document.id,
        bytes.len()
    );
    Ok(document)
}

fn load_document(db: &Database, id: &str) -> Result<DocumentRow> {
    document_repo::find_by_id(db, id)?.ok_or_else(|| CitecastError::not_found("Document", id))
}

/// The document plus its stage history, most recent run first.
pub fn document_status(db: &Database, id: &str) -> Result<DocumentStatusView> {
    let document = load_document(db, id)?;
    let job_runs = job_run_repo::list_for_document(db, id)?;
    Ok(DocumentStatusView { document, job_runs })
}

/// Everything the pipeline produced for a document.
pub fn document_results(db: &Database, id: &str) -> Result<DocumentResults> {
    let document = load_document(db, id)?;
    let metadata = metadata_repo::find_by_document(db, id)?;
    let extraction = extraction_repo::find_by_document(db, id)?;

    let posts = post_variant_repo::list_for_document(db, id)?
        .into_iter()
        .map(|post| {
            let exports = export_repo::list_for_post_variant(db, &post.id)?;
            Ok(PostWithExports { post, exports })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DocumentResults {
        document,
        metadata,
        extraction,
        posts,
    })
}

/// The 100 most recently uploaded documents.
pub fn list_documents(db: &Database) -> Result<Vec<DocumentRow>> {
    Ok(document_repo::list_recent(db, DOCUMENT_LIST_LIMIT)?)
}

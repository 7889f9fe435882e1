use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::config::{Config, LimitsConfig};
use crate::contracts::Extraction;
use crate::db::metadata_repo::MetadataRow;
use crate::db::post_variant_repo::PostVariantRow;
use crate::db::{
    document_repo, extraction_repo, metadata_repo, now_rfc3339, post_variant_repo, Database,
};
use crate::error::{CitecastError, Result};
use crate::export::{Exporter, HtmlExporter};
use crate::external::{BibliographicLookup, CrossrefClient, OpenAccessLookup, UnpaywallClient};
use crate::llm::{self, ExtractClaimsInput, GeneratePostsInput, LlmProvider};
use crate::processor::{detect_doi, LopdfExtractor, PdfTextExtractor};
use crate::sanitize;
use crate::storage::{FileStorage, StorageReader};

use super::context::{Enrichment, ParsedDocument};
use super::policy::build_text_for_llm;
use super::stage::{DocumentStatus, Stage};
use super::tracker::JobRunTracker;

pub const EXTRACTION_SCHEMA_VERSION: &str = "1.0.0";
const GENERATED_TONE: &str = "neutral";

/// Collaborators the pipeline talks to. Production wiring lives in
/// [`Pipeline::from_config`]; tests substitute fakes.
pub struct PipelineServices {
    pub storage: Arc<dyn StorageReader>,
    pub pdf: Arc<dyn PdfTextExtractor>,
    pub bibliographic: Arc<dyn BibliographicLookup>,
    pub open_access: Arc<dyn OpenAccessLookup>,
    pub llm: Arc<dyn LlmProvider>,
    pub exporter: Arc<dyn Exporter>,
}

/// Drives one document through every stage and owns its status.
#[derive(Clone)]
pub struct Pipeline {
    db: Database,
    tracker: JobRunTracker,
    services: Arc<PipelineServices>,
    limits: LimitsConfig,
    runs: RunRegistry,
}

impl Pipeline {
    pub fn new(db: Database, services: PipelineServices, limits: LimitsConfig) -> Self {
        Self {
            tracker: JobRunTracker::new(db.clone()),
            db,
            services: Arc::new(services),
            limits,
            runs: RunRegistry::default(),
        }
    }

    /// Production constructor: local storage, lopdf, Crossref, Unpaywall,
    /// the Gemini/Groq router and the HTML exporter.
    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let storage = FileStorage::new(&config.storage_directory);
        let services = PipelineServices {
            storage: Arc::new(storage.clone()),
            pdf: Arc::new(LopdfExtractor::new(config.limits.abstract_max_chars)),
            bibliographic: Arc::new(CrossrefClient::new(&config.enrichment)?),
            open_access: Arc::new(UnpaywallClient::new(&config.enrichment)?),
            llm: Arc::new(llm::default_router(&config.llm)?),
            exporter: Arc::new(HtmlExporter::new(db.clone(), storage, &config.export)?),
        };
        Ok(Self::new(db, services, config.limits))
    }

    /// Runs every stage for `document_id` and leaves it READY or FAILED.
    ///
    /// A document already being run by this pipeline is rejected with
    /// `AlreadyProcessing` without touching any rows.
    pub async fn run(&self, document_id: &str) -> Result<()> {
        let _claim = self.runs.claim(document_id)?;
        let span = info_span!("pipeline", document_id = %document_id);
        self.run_claimed(document_id).instrument(span).await
    }

    /// Spawns [`Pipeline::run`] on the runtime. A failure is recorded on the
    /// document and logged before the handle resolves.
    pub fn run_detached(&self, document_id: &str) -> JoinHandle<Result<()>> {
        let pipeline = self.clone();
        let document_id = document_id.to_string();

        tokio::spawn(async move {
            let result = pipeline.run(&document_id).await;
            match &result {
                Ok(()) => {}
                Err(e @ CitecastError::AlreadyProcessing { .. }) => {
                    log::warn!("Detached run for {} rejected: {}", document_id, e);
                }
                Err(e) => {
                    pipeline.mark_failed(&document_id);
                    log::error!("Pipeline failed for document {}: {}", document_id, e);
                }
            }
            result
        })
    }

    async fn run_claimed(&self, document_id: &str) -> Result<()> {
        let started = Instant::now();
        if !document_repo::update_status(
            &self.db,
            document_id,
            DocumentStatus::Processing.as_str(),
            &now_rfc3339(),
        )? {
            return Err(CitecastError::not_found("Document", document_id));
        }
        log::info!("Processing document {}", document_id);

        match self.run_stages(document_id).await {
            Ok(()) => {
                document_repo::update_status(
                    &self.db,
                    document_id,
                    DocumentStatus::Ready.as_str(),
                    &now_rfc3339(),
                )?;
                log::info!(
                    "Document {} ready in {}ms",
                    document_id,
                    started.elapsed().as_millis()
                );
                Ok(())
            }
            Err(e) => {
                self.mark_failed(document_id);
                Err(e)
            }
        }
    }

    async fn run_stages(&self, id: &str) -> Result<()> {
        let parsed = self
            .tracker
            .run_stage(id, Stage::ParsePdf, || self.step_parse_pdf(id))
            .await?;

        let enrichment = self
            .tracker
            .run_stage(id, Stage::MetadataEnrich, || {
                self.step_enrich_metadata(id, parsed.detected_doi.clone())
            })
            .await?;

        let extraction = self
            .tracker
            .run_stage(id, Stage::Extraction, || {
                self.step_extract_claims(id, &parsed, &enrichment)
            })
            .await?;

        let post_count = self
            .tracker
            .run_stage(id, Stage::PostGeneration, || {
                self.step_generate_posts(id, &extraction)
            })
            .await?;

        let export_count = self
            .tracker
            .run_stage(id, Stage::ExportRender, || self.step_export(id))
            .await?;

        log::debug!(
            "Document {}: {} post variants, {} exports",
            id,
            post_count,
            export_count
        );
        Ok(())
    }

    /// Idempotent FAILED write. Errors here are logged, never raised, so the
    /// caller's original error survives.
    fn mark_failed(&self, document_id: &str) {
        if let Err(e) = document_repo::update_status(
            &self.db,
            document_id,
            DocumentStatus::Failed.as_str(),
            &now_rfc3339(),
        ) {
            log::error!("Failed to mark document {} as FAILED: {}", document_id, e);
        }
    }

    async fn step_parse_pdf(&self, id: &str) -> Result<ParsedDocument> {
        let document = document_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| CitecastError::not_found("Document", id))?;

        let bytes = self
            .services
            .storage
            .read_file(Path::new(&document.storage_path))
            .await?;

        let pdf = Arc::clone(&self.services.pdf);
        let parsed = tokio::task::spawn_blocking(move || pdf.parse(&bytes))
            .await
            .map_err(|e| CitecastError::Application {
                message: format!("PDF parsing task failed: {}", e),
                source: Some(Box::new(e)),
            })??;

        let detected_doi = detect_doi(&parsed.text);
        log::info!(
            "Parsed {} ({} chars, DOI: {})",
            sanitize::redact_path(Path::new(&document.storage_path)),
            parsed.text.chars().count(),
            detected_doi.as_deref().unwrap_or("none")
        );

        Ok(ParsedDocument {
            text: parsed.text,
            abstract_text: parsed.abstract_text,
            detected_doi,
        })
    }

    async fn step_enrich_metadata(
        &self,
        id: &str,
        detected_doi: Option<String>,
    ) -> Result<Enrichment> {
        let existing = metadata_repo::find_by_document(&self.db, id)?;
        let doi = detected_doi.or_else(|| existing.as_ref().and_then(|m| m.doi.clone()));

        let (crossref, open_access) = match doi.as_deref() {
            Some(doi) => {
                let crossref = self.services.bibliographic.find_by_doi(doi).await?;
                let open_access = match self.services.open_access.find_by_doi(doi).await {
                    Ok(record) => Some(record),
                    Err(e) => {
                        log::warn!("Open-access lookup failed for DOI {}: {}", doi, e);
                        None
                    }
                };
                (Some(crossref), open_access)
            }
            None => {
                log::info!("No DOI for document {}, skipping lookups", id);
                (None, None)
            }
        };

        let now = now_rfc3339();
        let stored = existing.as_ref();
        let metadata = MetadataRow {
            document_id: id.to_string(),
            title: crossref
                .as_ref()
                .map(|c| c.title.clone())
                .filter(|t| !t.is_empty())
                .or_else(|| stored.and_then(|m| m.title.clone())),
            authors: crossref
                .as_ref()
                .map(|c| c.authors.clone())
                .or_else(|| stored.and_then(|m| m.authors.clone())),
            year: crossref
                .as_ref()
                .and_then(|c| c.year)
                .or_else(|| stored.and_then(|m| m.year)),
            doi: crossref.as_ref().map(|c| c.doi.clone()).or(doi),
            url: crossref
                .as_ref()
                .and_then(|c| c.url.clone())
                .or_else(|| stored.and_then(|m| m.url.clone())),
            is_open_access: open_access
                .as_ref()
                .map(|o| o.is_open_access)
                .or_else(|| stored.map(|m| m.is_open_access))
                .unwrap_or(false),
            oa_url: open_access
                .as_ref()
                .and_then(|o| o.oa_url.clone())
                .or_else(|| stored.and_then(|m| m.oa_url.clone())),
            retraction_status: stored.and_then(|m| m.retraction_status.clone()),
            created_at: stored.map(|m| m.created_at.clone()).unwrap_or_else(|| now.clone()),
            updated_at: now,
        };
        metadata_repo::upsert(&self.db, &metadata)?;

        Ok(Enrichment {
            doi: metadata.doi,
            is_open_access: open_access
                .map(|o| o.is_open_access)
                .or_else(|| stored.map(|m| m.is_open_access)),
        })
    }

    async fn step_extract_claims(
        &self,
        id: &str,
        parsed: &ParsedDocument,
        enrichment: &Enrichment,
    ) -> Result<Extraction> {
        let document_text = build_text_for_llm(
            &parsed.text,
            parsed.abstract_text.as_deref(),
            enrichment.is_open_access,
            &self.limits,
        );
        log::debug!(
            "Forwarding {} chars for extraction (open access: {:?})",
            document_text.chars().count(),
            enrichment.is_open_access
        );

        let input = ExtractClaimsInput {
            document_text,
            abstract_text: parsed.abstract_text.clone(),
            doi: enrichment.doi.clone(),
        };
        let extraction = self.services.llm.extract_claims(&input).await?;

        extraction_repo::upsert(
            &self.db,
            id,
            &extraction,
            EXTRACTION_SCHEMA_VERSION,
            &now_rfc3339(),
        )?;
        Ok(extraction)
    }

    async fn step_generate_posts(&self, id: &str, extraction: &Extraction) -> Result<usize> {
        let posts = self
            .services
            .llm
            .generate_posts(&GeneratePostsInput::new(extraction.clone()))
            .await?;

        let now = now_rfc3339();
        let rows: Vec<PostVariantRow> = posts
            .into_iter()
            .map(|post| PostVariantRow {
                id: Uuid::new_v4().to_string(),
                document_id: id.to_string(),
                platform: post.platform.as_str().to_string(),
                tone: GENERATED_TONE.to_string(),
                length: length_bucket(&post.content_text).to_string(),
                content_text: post.content_text,
                hashtags: post.hashtags,
                citation_block: Some(post.citation_block),
                citations: extraction.citations.clone(),
                created_at: now.clone(),
                updated_at: now.clone(),
            })
            .collect();

        post_variant_repo::replace_for_document(&self.db, id, &rows)?;
        Ok(rows.len())
    }

    async fn step_export(&self, id: &str) -> Result<usize> {
        let exports = self.services.exporter.export_document(id).await?;
        Ok(exports.len())
    }
}

/// `short` under 280 characters, `medium` under 900, `long` otherwise.
pub fn length_bucket(content: &str) -> &'static str {
    match content.chars().count() {
        0..=279 => "short",
        280..=899 => "medium",
        _ => "long",
    }
}

/// Documents currently owned by a run in this process.
#[derive(Clone, Default)]
struct RunRegistry {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl RunRegistry {
    fn claim(&self, document_id: &str) -> Result<RunClaim> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| CitecastError::application("Run registry lock poisoned"))?;

        if !in_flight.insert(document_id.to_string()) {
            return Err(CitecastError::AlreadyProcessing {
                document_id: document_id.to_string(),
            });
        }

        Ok(RunClaim {
            in_flight: Arc::clone(&self.in_flight),
            document_id: document_id.to_string(),
        })
    }
}

/// Releases the document when the run ends, however it ends.
struct RunClaim {
    in_flight: Arc<Mutex<HashSet<String>>>,
    document_id: String,
}

impl Drop for RunClaim {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.document_id);
        }
    }
}

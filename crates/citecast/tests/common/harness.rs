//! Isolated environment for pipeline integration tests.
//!
//! Every harness owns a temporary storage root and an in-memory database, so
//! tests never share state.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use citecast::config::{ExportConfig, LimitsConfig};
use citecast::db::document_repo::{self, DocumentRow};
use citecast::db::job_run_repo::{self, JobRunRow};
use citecast::{ingest, Database, FileStorage, HtmlExporter, Pipeline, PipelineServices};

use super::fakes::FakeServices;

pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n% fake body for tests\n";

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub storage: FileStorage,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_in_memory().expect("Failed to create test database");
        let storage = FileStorage::new(temp_dir.path());
        Self {
            temp_dir,
            db,
            storage,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Uploads a placeholder PDF and returns the PENDING document.
    pub async fn upload(&self, filename: &str) -> DocumentRow {
        ingest::ingest_pdf(&self.db, &self.storage, filename, SAMPLE_PDF)
            .await
            .expect("Failed to ingest test PDF")
    }

    /// Pipeline wired to `fakes` with the real HTML exporter.
    pub fn pipeline(&self, fakes: &FakeServices) -> Pipeline {
        self.pipeline_with_limits(fakes, LimitsConfig::default())
    }

    pub fn pipeline_with_limits(&self, fakes: &FakeServices, limits: LimitsConfig) -> Pipeline {
        let exporter = HtmlExporter::new(
            self.db.clone(),
            self.storage.clone(),
            &ExportConfig::default(),
        )
        .expect("Failed to create exporter");

        let services = PipelineServices {
            storage: Arc::new(self.storage.clone()),
            pdf: fakes.pdf.clone(),
            bibliographic: fakes.crossref.clone(),
            open_access: fakes.unpaywall.clone(),
            llm: fakes.llm.clone(),
            exporter: Arc::new(exporter),
        };
        Pipeline::new(self.db.clone(), services, limits)
    }

    pub fn document(&self, id: &str) -> DocumentRow {
        document_repo::find_by_id(&self.db, id)
            .expect("Failed to load document")
            .expect("Document missing")
    }

    /// Stage runs for `id` in the order they were started.
    pub fn job_runs(&self, id: &str) -> Vec<JobRunRow> {
        let mut runs = job_run_repo::list_for_document(&self.db, id).expect("Failed to list runs");
        runs.reverse();
        runs
    }

    pub fn stages_with_status(&self, id: &str) -> Vec<(String, String)> {
        self.job_runs(id)
            .into_iter()
            .map(|run| (run.stage, run.status))
            .collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

//! Scripted collaborators for the pipeline.
//!
//! Each fake records what it was asked so tests can assert on the calls.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use citecast::contracts::{Citation, Extraction, Platform, PostVariant};
use citecast::error::{CitecastError, ProcessError, Result};
use citecast::external::{BibliographicLookup, CrossrefRecord, OpenAccessLookup, OpenAccessRecord};
use citecast::llm::{ExtractClaimsInput, GeneratePostsInput, LlmProvider};
use citecast::processor::{ParsedPdf, PdfTextExtractor};

pub const SAMPLE_DOI: &str = "10.1000/xyz123";

pub fn paper_text() -> String {
    format!(
        "Sodium reduction in adults\nAbstract\nA short abstract.\nMethods\n{}\ndoi: {}.",
        "Body sentence. ".repeat(40),
        SAMPLE_DOI
    )
}

pub fn sample_extraction() -> Extraction {
    Extraction {
        claims: vec![
            "Lower sodium intake reduced systolic pressure".to_string(),
            "The effect held across age groups".to_string(),
            "Adherence was high".to_string(),
        ],
        population: "Adults with hypertension".to_string(),
        intervention: "Low-sodium diet".to_string(),
        outcomes: "Reduced systolic pressure".to_string(),
        limitations: "Short follow-up".to_string(),
        evidence_level: "RCT".to_string(),
        confidence_score: 0.82,
        citations: vec![Citation {
            title: "Sodium reduction trial".to_string(),
            doi: Some(SAMPLE_DOI.to_string()),
            url: Some("https://example.org/paper".to_string()),
            year: Some(2024),
            source_used: true,
        }],
    }
}

/// One post per length bucket: 100, 500 and 1000 characters.
pub fn sample_posts() -> Vec<PostVariant> {
    [(Platform::X, 100), (Platform::Linkedin, 500), (Platform::Bluesky, 1000)]
        .into_iter()
        .map(|(platform, len)| PostVariant {
            platform,
            content_text: "p".repeat(len),
            hashtags: Some(vec!["#health".to_string()]),
            citation_block: format!("Source: doi:{}", SAMPLE_DOI),
        })
        .collect()
}

pub fn crossref_record() -> CrossrefRecord {
    CrossrefRecord {
        title: "Sodium reduction trial".to_string(),
        authors: vec!["Ada Smith".to_string(), "Lin Wu".to_string()],
        year: Some(2024),
        url: Some("https://doi.org/10.1000/xyz123".to_string()),
        doi: SAMPLE_DOI.to_string(),
    }
}

// PDF

pub struct FakeExtractor {
    text: String,
    abstract_text: Option<String>,
    fail: bool,
}

impl FakeExtractor {
    pub fn returning(text: impl Into<String>, abstract_text: Option<&str>) -> Self {
        Self {
            text: text.into(),
            abstract_text: abstract_text.map(str::to_string),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            abstract_text: None,
            fail: true,
        }
    }
}

impl PdfTextExtractor for FakeExtractor {
    fn parse(&self, _bytes: &[u8]) -> std::result::Result<ParsedPdf, ProcessError> {
        if self.fail {
            return Err(ProcessError::PdfProcessing("corrupt xref table".to_string()));
        }
        Ok(ParsedPdf {
            text: self.text.clone(),
            abstract_text: self.abstract_text.clone(),
        })
    }
}

// Lookups

#[derive(Default)]
pub struct FakeCrossref {
    record: Option<CrossrefRecord>,
    pub requested: Mutex<Vec<String>>,
}

impl FakeCrossref {
    pub fn returning(record: CrossrefRecord) -> Self {
        Self {
            record: Some(record),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl BibliographicLookup for FakeCrossref {
    async fn find_by_doi(&self, doi: &str) -> Result<CrossrefRecord> {
        self.requested.lock().unwrap().push(doi.to_string());
        self.record
            .clone()
            .ok_or_else(|| CitecastError::external("crossref", Some(503), "Crossref request failed"))
    }
}

#[derive(Default)]
pub struct FakeUnpaywall {
    record: Option<OpenAccessRecord>,
}

impl FakeUnpaywall {
    pub fn open_access(is_open_access: bool) -> Self {
        Self {
            record: Some(OpenAccessRecord {
                is_open_access,
                oa_url: is_open_access.then(|| "https://example.org/oa.pdf".to_string()),
            }),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpenAccessLookup for FakeUnpaywall {
    async fn find_by_doi(&self, _doi: &str) -> Result<OpenAccessRecord> {
        self.record
            .clone()
            .ok_or_else(|| CitecastError::external("unpaywall", Some(500), "Unpaywall request failed"))
    }
}

// LLM

/// Pauses `extract_claims` until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub struct ScriptedLlm {
    extraction: Option<Extraction>,
    posts: Option<Vec<PostVariant>>,
    gate: Option<Arc<Gate>>,
    pub extract_inputs: Mutex<Vec<ExtractClaimsInput>>,
    pub generate_calls: Mutex<usize>,
}

impl ScriptedLlm {
    pub fn new(extraction: Extraction, posts: Vec<PostVariant>) -> Self {
        Self {
            extraction: Some(extraction),
            posts: Some(posts),
            gate: None,
            extract_inputs: Mutex::new(Vec::new()),
            generate_calls: Mutex::new(0),
        }
    }

    pub fn failing_extraction() -> Self {
        Self {
            extraction: None,
            ..Self::new(sample_extraction(), sample_posts())
        }
    }

    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(sample_extraction(), sample_posts())
        }
    }

    pub fn last_document_text(&self) -> String {
        self.extract_inputs
            .lock()
            .unwrap()
            .last()
            .map(|input| input.document_text.clone())
            .expect("extract_claims was never called")
    }

    pub fn generate_count(&self) -> usize {
        *self.generate_calls.lock().unwrap()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn extract_claims(&self, input: &ExtractClaimsInput) -> Result<Extraction> {
        self.extract_inputs.lock().unwrap().push(input.clone());
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.extraction.clone().ok_or(CitecastError::Unavailable)
    }

    async fn generate_posts(&self, _input: &GeneratePostsInput) -> Result<Vec<PostVariant>> {
        *self.generate_calls.lock().unwrap() += 1;
        self.posts.clone().ok_or(CitecastError::Unavailable)
    }
}

/// The set of fakes one pipeline is wired to, kept so tests can inspect them.
pub struct FakeServices {
    pub pdf: Arc<FakeExtractor>,
    pub crossref: Arc<FakeCrossref>,
    pub unpaywall: Arc<FakeUnpaywall>,
    pub llm: Arc<ScriptedLlm>,
}

impl FakeServices {
    /// Everything succeeds; the paper is closed access.
    pub fn happy() -> Self {
        Self {
            pdf: Arc::new(FakeExtractor::returning(paper_text(), Some("A short abstract."))),
            crossref: Arc::new(FakeCrossref::returning(crossref_record())),
            unpaywall: Arc::new(FakeUnpaywall::open_access(false)),
            llm: Arc::new(ScriptedLlm::new(sample_extraction(), sample_posts())),
        }
    }

    pub fn with_pdf(mut self, pdf: FakeExtractor) -> Self {
        self.pdf = Arc::new(pdf);
        self
    }

    pub fn with_crossref(mut self, crossref: FakeCrossref) -> Self {
        self.crossref = Arc::new(crossref);
        self
    }

    pub fn with_unpaywall(mut self, unpaywall: FakeUnpaywall) -> Self {
        self.unpaywall = Arc::new(unpaywall);
        self
    }

    pub fn with_llm(mut self, llm: ScriptedLlm) -> Self {
        self.llm = Arc::new(llm);
        self
    }
}

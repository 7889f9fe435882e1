pub mod context;
pub mod policy;
pub mod runner;
pub mod stage;
pub mod tracker;

pub use context::{Enrichment, ParsedDocument};
pub use policy::build_text_for_llm;
pub use runner::{length_bucket, Pipeline, PipelineServices, EXTRACTION_SCHEMA_VERSION};
pub use stage::{DocumentStatus, JobRunStatus, Stage};
pub use tracker::JobRunTracker;

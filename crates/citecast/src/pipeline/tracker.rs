use std::future::Future;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use crate::db::{job_run_repo, now_rfc3339, Database};
use crate::error::Result;
use crate::sanitize;

use super::stage::{JobRunStatus, Stage};

/// Longest error message persisted on a failed run.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 1000;

/// Wraps one stage body with a persisted RUNNING → SUCCEEDED/FAILED record.
#[derive(Clone)]
pub struct JobRunTracker {
    db: Database,
}

impl JobRunTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Runs `body` and records exactly one terminal transition for it.
    ///
    /// A failure in the body is stored (truncated) and then returned to the
    /// caller as-is.
    pub async fn run_stage<T, F, Fut>(&self, document_id: &str, stage: Stage, body: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let run_id = Uuid::new_v4().to_string();
        job_run_repo::insert(
            &self.db,
            &job_run_repo::JobRunRow {
                id: run_id.clone(),
                document_id: document_id.to_string(),
                stage: stage.as_str().to_string(),
                status: JobRunStatus::Running.as_str().to_string(),
                duration_ms: None,
                error_message: None,
                created_at: now_rfc3339(),
            },
        )?;
        let started = Instant::now();

        let span = tracing::info_span!("stage", stage = stage.as_str());
        let outcome = body().instrument(span).await;
        let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        match outcome {
            Ok(value) => {
                job_run_repo::finish(
                    &self.db,
                    &run_id,
                    JobRunStatus::Succeeded.as_str(),
                    duration_ms,
                    None,
                )?;
                log::debug!("Stage {} succeeded in {}ms", stage, duration_ms);
                Ok(value)
            }
            Err(err) => {
                let message = sanitize::truncate_chars(&err.to_string(), MAX_ERROR_MESSAGE_CHARS);
                if let Err(db_err) = job_run_repo::finish(
                    &self.db,
                    &run_id,
                    JobRunStatus::Failed.as_str(),
                    duration_ms,
                    Some(&message),
                ) {
                    log::error!("Failed to record {} failure: {}", stage, db_err);
                }
                log::warn!("Stage {} failed after {}ms: {}", stage, duration_ms, message);
                Err(err)
            }
        }
    }
}

//! Append-only stage run history in the `job_runs` table.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRunRow {
    pub id: String,
    pub document_id: String,
    pub stage: String,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: String,
}

impl JobRunRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            stage: row.get("stage")?,
            status: row.get("status")?,
            duration_ms: row.get("duration_ms")?,
            error_message: row.get("error_message")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, run: &JobRunRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO job_runs (id, document_id, stage, status, duration_ms, error_message,
             created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.id,
                run.document_id,
                run.stage,
                run.status,
                run.duration_ms,
                run.error_message,
                run.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Records the terminal outcome of a run.
pub fn finish(
    db: &Database,
    id: &str,
    status: &str,
    duration_ms: i64,
    error_message: Option<&str>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE job_runs SET status = ?2, duration_ms = ?3, error_message = ?4 WHERE id = ?1",
            params![id, status, duration_ms, error_message],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRunRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM job_runs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRunRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// All runs for a document, most recent first.
pub fn list_for_document(db: &Database, document_id: &str) -> Result<Vec<JobRunRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM job_runs WHERE document_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![document_id], JobRunRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

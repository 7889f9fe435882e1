//! Validated claim extractions, one row per document.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{json_column_error, Database, DatabaseError};
use crate::contracts::Extraction;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRow {
    pub document_id: String,
    pub schema_version: String,
    pub extraction: Extraction,
    pub confidence_score: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl ExtractionRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let json: String = row.get("extracted_json")?;
        let extraction = serde_json::from_str(&json).map_err(|e| json_column_error(2, e))?;

        Ok(Self {
            document_id: row.get("document_id")?,
            schema_version: row.get("schema_version")?,
            extraction,
            confidence_score: row.get("confidence_score")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Stores `extraction` for the document, replacing any earlier one.
pub fn upsert(
    db: &Database,
    document_id: &str,
    extraction: &Extraction,
    schema_version: &str,
    now: &str,
) -> Result<(), DatabaseError> {
    let json = serde_json::to_string(extraction)?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO extractions (document_id, schema_version, extracted_json,
             confidence_score, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(document_id) DO UPDATE SET
                schema_version = excluded.schema_version,
                extracted_json = excluded.extracted_json,
                confidence_score = excluded.confidence_score,
                updated_at = excluded.updated_at",
            params![
                document_id,
                schema_version,
                json,
                extraction.confidence_score,
                now
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_document(
    db: &Database,
    document_id: &str,
) -> Result<Option<ExtractionRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM extractions WHERE document_id = ?1")?;
        let mut rows = stmt.query_map(params![document_id], ExtractionRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

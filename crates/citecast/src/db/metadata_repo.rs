//! Bibliographic metadata, one row per document.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{json_column_error, Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRow {
    pub document_id: String,
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub is_open_access: bool,
    pub oa_url: Option<String>,
    pub retraction_status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MetadataRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let authors_json: Option<String> = row.get("authors_json")?;
        let authors = authors_json
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| json_column_error(2, e))?;

        Ok(Self {
            document_id: row.get("document_id")?,
            title: row.get("title")?,
            authors,
            year: row.get("year")?,
            doi: row.get("doi")?,
            url: row.get("url")?,
            is_open_access: row.get("is_open_access")?,
            oa_url: row.get("oa_url")?,
            retraction_status: row.get("retraction_status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub fn find_by_document(
    db: &Database,
    document_id: &str,
) -> Result<Option<MetadataRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM document_metadata WHERE document_id = ?1")?;
        let mut rows = stmt.query_map(params![document_id], MetadataRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Inserts or overwrites the metadata row. `created_at` is kept from the
/// first insert.
pub fn upsert(db: &Database, metadata: &MetadataRow) -> Result<(), DatabaseError> {
    let authors_json = metadata
        .authors
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO document_metadata (document_id, title, authors_json, year, doi, url,
             is_open_access, oa_url, retraction_status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(document_id) DO UPDATE SET
                title = excluded.title,
                authors_json = excluded.authors_json,
                year = excluded.year,
                doi = excluded.doi,
                url = excluded.url,
                is_open_access = excluded.is_open_access,
                oa_url = excluded.oa_url,
                retraction_status = excluded.retraction_status,
                updated_at = excluded.updated_at",
            params![
                metadata.document_id,
                metadata.title,
                authors_json,
                metadata.year,
                metadata.doi,
                metadata.url,
                metadata.is_open_access,
                metadata.oa_url,
                metadata.retraction_status,
                metadata.created_at,
                metadata.updated_at,
            ],
        )?;
        Ok(())
    })
}

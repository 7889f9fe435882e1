use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// A rendered artifact on disk for one post variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub id: String,
    pub post_variant_id: String,
    pub template_id: String,
    pub format: String,
    pub artifact_path: String,
    pub created_at: String,
}

impl ExportRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            post_variant_id: row.get("post_variant_id")?,
            template_id: row.get("template_id")?,
            format: row.get("format")?,
            artifact_path: row.get("artifact_path")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(db: &Database, export: &ExportRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO exports (id, post_variant_id, template_id, format, artifact_path,
             created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                export.id,
                export.post_variant_id,
                export.template_id,
                export.format,
                export.artifact_path,
                export.created_at,
            ],
        )?;
        Ok(())
    })
}

pub fn list_for_post_variant(
    db: &Database,
    post_variant_id: &str,
) -> Result<Vec<ExportRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM exports WHERE post_variant_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![post_variant_id], ExportRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

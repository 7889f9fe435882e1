//! Generated post variants. A document's set is replaced wholesale on every
//! generation run; individual rows can be edited afterwards.

use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{json_column_error, Database, DatabaseError};
use crate::contracts::Citation;
use crate::error::{CitecastError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVariantRow {
    pub id: String,
    pub document_id: String,
    pub platform: String,
    pub tone: String,
    pub length: String,
    pub content_text: String,
    pub hashtags: Option<Vec<String>>,
    pub citation_block: Option<String>,
    pub citations: Vec<Citation>,
    pub created_at: String,
    pub updated_at: String,
}

impl PostVariantRow {
    fn from_row(row: &Row<'_>) -> std::result::Result<Self, rusqlite::Error> {
        let hashtags_json: Option<String> = row.get("hashtags_json")?;
        let hashtags = hashtags_json
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| json_column_error(6, e))?;
        let citations_json: String = row.get("citations_json")?;
        let citations = serde_json::from_str(&citations_json).map_err(|e| json_column_error(8, e))?;

        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            platform: row.get("platform")?,
            tone: row.get("tone")?,
            length: row.get("length")?,
            content_text: row.get("content_text")?,
            hashtags,
            citation_block: row.get("citation_block")?,
            citations,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Partial edit of a post variant. Every provided field must be non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVariantUpdate {
    pub platform: Option<String>,
    pub tone: Option<String>,
    pub length: Option<String>,
    pub content_text: Option<String>,
}

impl PostVariantUpdate {
    pub fn is_empty(&self) -> bool {
        self.platform.is_none()
            && self.tone.is_none()
            && self.length.is_none()
            && self.content_text.is_none()
    }

    /// Trims every field and rejects blanks or an empty update.
    fn normalized(&self) -> Result<Self> {
        if self.is_empty() {
            return Err(CitecastError::InvalidInput(
                "At least one field is required".to_string(),
            ));
        }

        let check = |name: &str, value: &Option<String>| -> Result<Option<String>> {
            match value {
                None => Ok(None),
                Some(v) if v.trim().is_empty() => Err(CitecastError::InvalidInput(format!(
                    "{} must not be empty",
                    name
                ))),
                Some(v) => Ok(Some(v.trim().to_string())),
            }
        };

        Ok(Self {
            platform: check("platform", &self.platform)?,
            tone: check("tone", &self.tone)?,
            length: check("length", &self.length)?,
            content_text: check("contentText", &self.content_text)?,
        })
    }
}

fn insert_row(conn: &rusqlite::Connection, post: &PostVariantRow) -> std::result::Result<(), DatabaseError> {
    let hashtags_json = post.hashtags.as_ref().map(serde_json::to_string).transpose()?;
    let citations_json = serde_json::to_string(&post.citations)?;

    conn.execute(
        "INSERT INTO post_variants (id, document_id, platform, tone, length, content_text,
         hashtags_json, citation_block, citations_json, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            post.id,
            post.document_id,
            post.platform,
            post.tone,
            post.length,
            post.content_text,
            hashtags_json,
            post.citation_block,
            citations_json,
            post.created_at,
            post.updated_at,
        ],
    )?;
    Ok(())
}

/// Deletes every variant of the document (and, by cascade, their exports)
/// and inserts `posts` in one transaction.
pub fn replace_for_document(
    db: &Database,
    document_id: &str,
    posts: &[PostVariantRow],
) -> std::result::Result<(), DatabaseError> {
    db.in_transaction(|tx| {
        tx.execute(
            "DELETE FROM post_variants WHERE document_id = ?1",
            params![document_id],
        )?;
        for post in posts {
            insert_row(tx, post)?;
        }
        Ok(())
    })
}

/// Variants of a document, most recent first.
pub fn list_for_document(
    db: &Database,
    document_id: &str,
) -> std::result::Result<Vec<PostVariantRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM post_variants WHERE document_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![document_id], PostVariantRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn find_by_id(
    db: &Database,
    id: &str,
) -> std::result::Result<Option<PostVariantRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM post_variants WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], PostVariantRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Applies a partial edit and returns the updated row.
pub fn update_fields(
    db: &Database,
    id: &str,
    update: &PostVariantUpdate,
    now: &str,
) -> Result<PostVariantRow> {
    let update = update.normalized()?;

    let changed = db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE post_variants SET
                platform = COALESCE(?2, platform),
                tone = COALESCE(?3, tone),
                length = COALESCE(?4, length),
                content_text = COALESCE(?5, content_text),
                updated_at = ?6
             WHERE id = ?1",
            params![
                id,
                update.platform,
                update.tone,
                update.length,
                update.content_text,
                now
            ],
        )?;
        Ok(changed)
    })?;

    if changed == 0 {
        return Err(CitecastError::not_found("Post variant", id));
    }

    find_by_id(db, id)?.ok_or_else(|| CitecastError::not_found("Post variant", id))
}

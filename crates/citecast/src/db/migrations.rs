//! Versioned schema migrations, tracked in a `_migrations` table and applied
//! in order on open.

use rusqlite::{params, Connection};

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_documents_table",
        sql: include_str!("sql/001_create_documents.sql"),
    },
    Migration {
        version: 2,
        description: "create_job_runs_table",
        sql: include_str!("sql/002_create_job_runs.sql"),
    },
    Migration {
        version: 3,
        description: "create_document_metadata_table",
        sql: include_str!("sql/003_create_document_metadata.sql"),
    },
    Migration {
        version: 4,
        description: "create_extractions_table",
        sql: include_str!("sql/004_create_extractions.sql"),
    },
    Migration {
        version: 5,
        description: "create_post_variants_table",
        sql: include_str!("sql/005_create_post_variants.sql"),
    },
    Migration {
        version: 6,
        description: "create_exports_table",
        sql: include_str!("sql/006_create_exports.sql"),
    },
];

/// Applies every migration newer than the recorded version. Each one runs
/// in its own transaction together with its `_migrations` row.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        log::info!(
            "Applying schema v{} ({})",
            migration.version,
            migration.description
        );

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)
            .map_err(|e| DatabaseError::Migration {
                version: migration.version,
                description: migration.description,
                source: e,
            })?;
        tx.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            params![migration.version, migration.description],
        )?;
        tx.commit()?;
    }

    Ok(())
}

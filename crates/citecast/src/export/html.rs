use async_trait::async_trait;
use tracing::info_span;
use uuid::Uuid;

use crate::config::ExportConfig;
use crate::db::export_repo::{self, ExportRow};
use crate::db::{now_rfc3339, post_variant_repo, Database};
use crate::error::{CitecastError, Result};
use crate::sanitize;
use crate::storage::FileStorage;

use super::templates::{self, summarize_citations, TemplateData, TemplateId};
use super::Exporter;

const EXPORT_DIRECTORY: &str = "exports";
const FORMAT: &str = "html";

/// Renders post variants to HTML files under `{storage}/exports/`.
pub struct HtmlExporter {
    db: Database,
    storage: FileStorage,
    enabled: bool,
    default_template: TemplateId,
}

impl HtmlExporter {
    pub fn new(db: Database, storage: FileStorage, config: &ExportConfig) -> Result<Self> {
        let default_template = TemplateId::parse(&config.template_id).ok_or_else(|| {
            CitecastError::Configuration(format!(
                "Unknown export template '{}'",
                config.template_id
            ))
        })?;

        Ok(Self {
            db,
            storage,
            enabled: config.enabled,
            default_template,
        })
    }

    /// Renders one post variant with `template_id` and records the artifact.
    pub async fn render_post_variant(
        &self,
        post_variant_id: &str,
        template_id: &str,
    ) -> Result<ExportRow> {
        let template = TemplateId::parse(template_id).ok_or_else(|| {
            CitecastError::InvalidInput(format!("Unsupported templateId: {}", template_id))
        })?;

        let post = post_variant_repo::find_by_id(&self.db, post_variant_id)?
            .ok_or_else(|| CitecastError::not_found("Post variant", post_variant_id))?;

        let html = {
            let _span =
                info_span!("export.render", post_variant_id = %post.id, template = %template)
                    .entered();
            let citations = serde_json::to_value(&post.citations).map_err(|e| {
                CitecastError::Application {
                    message: format!("Failed to encode citations: {}", e),
                    source: Some(Box::new(e)),
                }
            })?;
            templates::render(
                template,
                &TemplateData {
                    platform: post.platform.to_lowercase(),
                    content_text: post.content_text.clone(),
                    citation_summary: summarize_citations(&citations),
                },
            )?
        };

        let filename = format!(
            "{}-{}-{}.{}",
            post.id,
            chrono::Utc::now().timestamp_millis(),
            template,
            FORMAT
        );
        let path = self
            .storage
            .store(EXPORT_DIRECTORY, &filename, html.as_bytes())
            .await?;

        let export = ExportRow {
            id: Uuid::new_v4().to_string(),
            post_variant_id: post.id.clone(),
            template_id: template.as_str().to_string(),
            format: FORMAT.to_string(),
            artifact_path: path.to_string_lossy().into_owned(),
            created_at: now_rfc3339(),
        };
        export_repo::insert(&self.db, &export)?;

        log::info!(
            "Exported post variant {} as {}",
            post.id,
            sanitize::redact_path(&path)
        );
        Ok(export)
    }
}

#[async_trait]
impl Exporter for HtmlExporter {
    async fn export_document(&self, document_id: &str) -> Result<Vec<ExportRow>> {
        if !self.enabled {
            log::debug!("Export disabled, skipping document {}", document_id);
            return Ok(Vec::new());
        }

        let posts = post_variant_repo::list_for_document(&self.db, document_id)?;
        let mut exports = Vec::with_capacity(posts.len());
        for post in posts {
            exports.push(
                self.render_post_variant(&post.id, self.default_template.as_str())
                    .await?,
            );
        }
        Ok(exports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Citation;
    use crate::db::document_repo;
    use tempfile::TempDir;

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().expect("Failed to create test database");
        document_repo::insert(
            &db,
            &document_repo::DocumentRow {
                id: "doc-1".to_string(),
                original_filename: "paper.pdf".to_string(),
                storage_path: "/tmp/paper.pdf".to_string(),
                sha256: "abc".to_string(),
                status: "PROCESSING".to_string(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
                updated_at: "2026-01-01T00:00:00Z".to_string(),
            },
        )
        .unwrap();
        let post = |id: &str, platform: &str| post_variant_repo::PostVariantRow {
            id: id.to_string(),
            document_id: "doc-1".to_string(),
            platform: platform.to_string(),
            tone: "neutral".to_string(),
            length: "short".to_string(),
            content_text: "Less salt, lower pressure.".to_string(),
            hashtags: None,
            citation_block: Some("Trial 2024".to_string()),
            citations: vec![Citation {
                title: "Sodium trial".to_string(),
                doi: None,
                url: None,
                year: None,
                source_used: true,
            }],
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        };
        post_variant_repo::replace_for_document(&db, "doc-1", &[post("p1", "linkedin"), post("p2", "x")])
            .unwrap();
        db
    }

    fn exporter(db: &Database, dir: &TempDir, enabled: bool) -> HtmlExporter {
        HtmlExporter::new(
            db.clone(),
            FileStorage::new(dir.path()),
            &ExportConfig {
                enabled,
                template_id: "carousel_basic".to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_render_post_variant_writes_file_and_row() {
        let db = seeded_db();
        let dir = TempDir::new().unwrap();
        let exporter = exporter(&db, &dir, true);

        let export = exporter.render_post_variant("p1", "myth_vs_fact").await.unwrap();
        assert_eq!(export.format, "html");
        assert_eq!(export.template_id, "myth_vs_fact");
        assert!(export.artifact_path.ends_with("-myth_vs_fact.html"));
        assert!(export.artifact_path.contains("p1-"));

        let html = std::fs::read_to_string(&export.artifact_path).unwrap();
        assert!(html.contains("Sources: Sodium trial"));
        assert!(html.contains("LINKEDIN"));

        let rows = export_repo::list_for_post_variant(&db, "p1").unwrap();
        assert_eq!(rows, vec![export]);
    }

    #[tokio::test]
    async fn test_unknown_template_is_invalid_input() {
        let db = seeded_db();
        let dir = TempDir::new().unwrap();
        let err = exporter(&db, &dir, true)
            .render_post_variant("p1", "poster")
            .await
            .unwrap_err();
        assert!(matches!(err, CitecastError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_variant_is_not_found() {
        let db = seeded_db();
        let dir = TempDir::new().unwrap();
        let err = exporter(&db, &dir, true)
            .render_post_variant("ghost", "carousel_basic")
            .await
            .unwrap_err();
        assert!(matches!(err, CitecastError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_export_document_renders_every_variant() {
        let db = seeded_db();
        let dir = TempDir::new().unwrap();
        let exports = exporter(&db, &dir, true).export_document("doc-1").await.unwrap();
        assert_eq!(exports.len(), 2);
        assert!(exports.iter().all(|e| e.template_id == "carousel_basic"));
    }

    #[tokio::test]
    async fn test_disabled_export_is_noop() {
        let db = seeded_db();
        let dir = TempDir::new().unwrap();
        let exports = exporter(&db, &dir, false).export_document("doc-1").await.unwrap();
        assert!(exports.is_empty());
        assert!(!dir.path().join("exports").exists());
    }

    #[test]
    fn test_unknown_configured_template_is_rejected() {
        let db = seeded_db();
        let dir = TempDir::new().unwrap();
        let result = HtmlExporter::new(
            db,
            FileStorage::new(dir.path()),
            &ExportConfig {
                enabled: true,
                template_id: "poster".to_string(),
            },
        );
        assert!(matches!(result, Err(CitecastError::Configuration(_))));
    }
}

//! `citecast` command line.
//!
//! Every command prints JSON to stdout. Failures print `{"error": {...}}` to
//! stderr and exit non-zero.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use citecast::config::{config_from_env, load_config, Config};
use citecast::db::post_variant_repo::{self, PostVariantUpdate};
use citecast::db::{now_rfc3339, Database};
use citecast::error::{CitecastError, Result, StorageError};
use citecast::export::HtmlExporter;
use citecast::{ingest, logging, FileStorage, Pipeline};

#[derive(Parser)]
#[command(name = "citecast", version)]
#[command(about = "Turn research PDFs into cited social posts")]
struct Cli {
    /// Path to a JSON config file (defaults plus environment otherwise)
    #[arg(short, long, env = "CITECAST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a PDF and register it as a pending document
    Upload { file: PathBuf },
    /// Run every pipeline stage for a document and wait for the outcome
    Process { id: String },
    /// Show a document and its stage history
    Status { id: String },
    /// Show metadata, extraction and post variants for a document
    Results { id: String },
    /// Render a post variant to HTML
    Export {
        post_id: String,
        /// carousel_basic, myth_vs_fact or clinical_summary
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Edit fields of a generated post variant
    EditPost {
        post_id: String,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        tone: Option<String>,
        #[arg(long)]
        length: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// List the most recent documents
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!(
                "{}",
                json!({ "error": { "code": e.code(), "message": e.to_string() } })
            );
            ExitCode::FAILURE
        }
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => config_from_env()?,
    };
    Ok(config)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| CitecastError::Application {
        message: format!("Failed to encode output: {}", e),
        source: Some(Box::new(e)),
    })
}

async fn run(cli: Cli) -> Result<Value> {
    let config = load(cli.config.as_deref())?;
    logging::init_logging(&config.logging);

    let db_path = config.resolved_database_path().ok_or_else(|| {
        CitecastError::Configuration("Could not determine a database path".to_string())
    })?;
    let db = Database::open(&db_path)?;
    let storage = FileStorage::new(&config.storage_directory);

    match cli.command {
        Command::Upload { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .map_err(|e| StorageError::ReadFile {
                    path: file.clone(),
                    source: e,
                })?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let document = ingest::ingest_pdf(&db, &storage, &filename, &bytes).await?;
            to_json(&document)
        }
        Command::Process { id } => {
            let pipeline = Pipeline::from_config(&config, db.clone())?;
            pipeline.run(&id).await?;
            to_json(&ingest::document_status(&db, &id)?)
        }
        Command::Status { id } => to_json(&ingest::document_status(&db, &id)?),
        Command::Results { id } => to_json(&ingest::document_results(&db, &id)?),
        Command::Export { post_id, template } => {
            let exporter = HtmlExporter::new(db, storage, &config.export)?;
            let template = template.unwrap_or_else(|| config.export.template_id.clone());
            to_json(&exporter.render_post_variant(&post_id, &template).await?)
        }
        Command::EditPost {
            post_id,
            platform,
            tone,
            length,
            content,
        } => {
            let update = PostVariantUpdate {
                platform,
                tone,
                length,
                content_text: content,
            };
            to_json(&post_variant_repo::update_fields(
                &db,
                &post_id,
                &update,
                &now_rfc3339(),
            )?)
        }
        Command::List => to_json(&ingest::list_documents(&db)?),
    }
}


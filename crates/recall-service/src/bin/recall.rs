//! recall: command-line access to the retrieval core.
//!
//! Items are loaded from a JSON array of `{title, content, type}` objects
//! into an in-memory knowledge base, then queried.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recall_core::{ItemType, ListItemsRequest, NewKnowledgeItem, SortOrder};
use recall_inference::{Embedder, InferenceConfig};
use recall_service::{InMemoryRepository, KnowledgeService, ServiceConfig};

/// Components of the vector printed by `recall embed`.
const EMBED_PREVIEW_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "recall")]
#[command(author, version, about = "Semantic retrieval and question answering over knowledge items")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed text and print the vector's shape
    Embed {
        /// Text to embed
        text: String,
    },

    /// Answer a question from a file of knowledge items
    Ask {
        /// JSON file holding an array of {title, content, type}
        #[arg(short, long)]
        items: PathBuf,

        /// Caller identity used for rate limiting
        #[arg(short, long, default_value = "cli")]
        client: String,

        /// Question to answer
        question: String,
    },

    /// List knowledge items with optional filters
    List {
        /// JSON file holding an array of {title, content, type}
        #[arg(short, long)]
        items: PathBuf,

        /// Case-insensitive substring of title or content
        #[arg(short, long)]
        search: Option<String>,

        /// Exact tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Item type (note, link, insight)
        #[arg(long = "type")]
        item_type: Option<ItemType>,

        /// Creation-time order (asc or desc)
        #[arg(long, default_value = "desc")]
        sort: SortOrder,

        #[arg(long)]
        page: Option<usize>,

        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logging configuration via environment variables:
///   LOG_FORMAT - "json" or "text" (default: text)
///   LOG_FILE   - path to a log file (optional, daily rotation)
///   RUST_LOG   - standard env filter (default: "info")
///
/// Console output goes to stderr so command output stays parseable.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let path = Path::new(path);
        let file_dir = path.parent().unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("recall.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        None
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Embed { text } => cmd_embed(&text).await,
        Commands::Ask {
            items,
            client,
            question,
        } => cmd_ask(&items, &client, &question).await,
        Commands::List {
            items,
            search,
            tag,
            item_type,
            sort,
            page,
            limit,
        } => {
            let request = ListItemsRequest {
                search,
                item_type,
                tag,
                sort,
                page,
                limit,
            };
            cmd_list(&items, request).await
        }
    }
}

fn build_service() -> anyhow::Result<KnowledgeService> {
    let inference = InferenceConfig::load().context("Failed to load inference config")?;
    let config = ServiceConfig::from_env().context("Failed to load service config")?;

    let embedding_backend = inference.build_embedding_backend()?;
    let generation_backend = inference.build_generation_backend()?;
    let dimension = Embedder::from_optional(embedding_backend.clone()).dimension();

    let repository = Arc::new(InMemoryRepository::new(dimension));
    Ok(KnowledgeService::from_config(
        &config,
        repository,
        embedding_backend,
        generation_backend,
    )?)
}

async fn load_items(service: &KnowledgeService, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let inputs: Vec<NewKnowledgeItem> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let count = inputs.len();
    for (index, input) in inputs.into_iter().enumerate() {
        service
            .ingest(input)
            .await
            .with_context(|| format!("Item {} in {} was rejected", index, path.display()))?;
    }
    info!(count, path = %path.display(), "Loaded knowledge items");
    Ok(count)
}

async fn cmd_embed(text: &str) -> anyhow::Result<()> {
    let inference = InferenceConfig::load().context("Failed to load inference config")?;
    let embedder = Embedder::from_optional(inference.build_embedding_backend()?);
    let vector = embedder.try_embed(text).await?;

    let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    let output = serde_json::json!({
        "model": embedder.model_name(),
        "dimension": vector.len(),
        "norm": norm,
        "head": vector.iter().take(EMBED_PREVIEW_LEN).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn cmd_ask(items: &Path, client: &str, question: &str) -> anyhow::Result<()> {
    let service = build_service()?;
    load_items(&service, items).await?;

    let answer = service.answer(question, client).await?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

async fn cmd_list(items: &Path, request: ListItemsRequest) -> anyhow::Result<()> {
    let service = build_service()?;
    load_items(&service, items).await?;

    let page = service.list(request).await?;
    let listed: Vec<serde_json::Value> = page
        .items
        .iter()
        .map(|item| {
            serde_json::json!({
                "id": item.id,
                "title": item.title,
                "type": item.item_type,
                "tags": item.tags,
                "summary": item.summary,
                "created_at": item.created_at,
            })
        })
        .collect();

    let output = serde_json::json!({
        "items": listed,
        "total": page.total,
        "page": page.page,
        "limit": page.limit,
        "total_pages": page.total_pages,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

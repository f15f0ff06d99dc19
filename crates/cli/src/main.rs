//! # folio: command-line front end for the book extraction pipeline
//!
//! Each subcommand maps to one orchestrator operation. State (books, page
//! artifacts, chapter artifacts) is kept in a `FileBookRepository` rooted at
//! `--state-dir`, so subcommands can be invoked one at a time across
//! separate process runs and resume where the last one left off.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use folio_core::cache::CacheStore;
use folio_core::config::{load_config, PipelineConfig};
use folio_core::digitize::HttpDigitizationClient;
use folio_core::llm::HttpLlmClient;
use folio_core::orchestrate::ExtractionOrchestrator;
use folio_core::types::Category;
use folio_store::FileBookRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a YAML config file. Falls back to ./config.yml, then
    /// documented defaults layered with FOLIO_-prefixed env vars.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Directory the file-backed repository and cache live under.
    #[arg(long, global = true, default_value = "./state")]
    state_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliCategory {
    History,
    Economy,
    Humanities,
    Science,
    Misc,
}

impl From<CliCategory> for Category {
    fn from(value: CliCategory) -> Self {
        match value {
            CliCategory::History => Category::History,
            CliCategory::Economy => Category::Economy,
            CliCategory::Humanities => Category::Humanities,
            CliCategory::Science => Category::Science,
            CliCategory::Misc => Category::Misc,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a PDF and advance it to `parsed`.
    Ingest {
        path: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: Option<String>,
        #[arg(long, value_enum, default_value = "misc")]
        category: CliCategory,
    },
    /// Compute (and optionally apply) a structure candidate for a book.
    Structure {
        book_id: String,
        /// Persist the candidate and advance the book to `structured`.
        #[arg(long)]
        apply: bool,
    },
    /// Extract structured data for every body page.
    ExtractPages { book_id: String },
    /// Synthesize every chapter from its constituent pages.
    ExtractChapters { book_id: String },
    /// Aggregate the book's artifacts into a final report.
    WriteReport { book_id: String },
}

fn build_orchestrator(config: PipelineConfig, state_dir: &str) -> Result<ExtractionOrchestrator> {
    let llm = HttpLlmClient::new(
        config.llm_endpoint.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
        config.llm_temperature,
        Duration::from_secs(config.llm_timeout_secs),
    )
    .context("failed to build LLM client")?;

    let digitization_client = HttpDigitizationClient::new(
        config.digitization_endpoint.clone(),
        config.digitization_api_key.clone(),
        Duration::from_secs(config.digitization_timeout_secs),
    )
    .context("failed to build digitization client")?;

    let cache = CacheStore::new(format!("{state_dir}/cache"));
    let repository = FileBookRepository::new(format!("{state_dir}/repository"));

    Ok(ExtractionOrchestrator::new(
        Arc::new(llm),
        Arc::new(digitization_client),
        Arc::new(cache),
        Arc::new(repository),
        config,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).compact().finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load pipeline configuration")?;
    let orchestrator = build_orchestrator(config, &cli.state_dir)?;

    match cli.command {
        Commands::Ingest { path, title, author, category } => {
            let book = orchestrator.ingest(&path, title, author, category.into()).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }
        Commands::Structure { book_id, apply } => {
            let candidate = orchestrator.structure_candidates(&book_id).await?;
            if apply {
                let book = orchestrator.apply_structure(&book_id, candidate).await?;
                println!("{}", serde_json::to_string_pretty(&book)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&candidate)?);
            }
        }
        Commands::ExtractPages { book_id } => {
            let progress = orchestrator.extract_pages(&book_id).await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        Commands::ExtractChapters { book_id } => {
            let progress = orchestrator.extract_chapters(&book_id).await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        Commands::WriteReport { book_id } => {
            let report = orchestrator.write_report(&book_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

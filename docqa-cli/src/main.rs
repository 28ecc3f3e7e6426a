//! `docqa` command-line interface.
//!
//! Ingests a directory of `.txt` files into Qdrant and answers questions
//! over them with OpenAI models. Settings come from the environment (see
//! [`Settings::from_env`]); flags override individual values.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docqa_rag::openai::{OpenAIChatAnswerer, OpenAIEmbeddingProvider};
use docqa_rag::qdrant::QdrantVectorStore;
use docqa_rag::{RagError, RagPipeline, SearchResult, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Question answering over a folder of text documents.
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Collection to read and write (overrides DOCQA_COLLECTION)
    #[arg(short, long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, chunk, embed, and store every .txt file in a directory
    Ingest {
        /// Directory containing the documents
        dir: PathBuf,

        /// Drop existing points before ingesting
        #[arg(long)]
        recreate: bool,

        /// Maximum chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared by consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Show the chunks most similar to a query
    Search {
        /// The search text
        query: String,

        /// Number of chunks to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Answer a question from the indexed documents
    Ask {
        /// The question
        question: String,

        /// Number of chunks to retrieve as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Also print the context handed to the model
        #[arg(long)]
        show_context: bool,
    },

    /// Show the configured collection and how many chunks it holds
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env().context("invalid configuration")?;
    if let Some(collection) = cli.collection {
        settings.collection.name = collection;
    }

    match cli.command {
        Commands::Ingest { dir, recreate, chunk_size, overlap } => {
            if let Some(size) = chunk_size {
                settings.rag.chunk_size = size;
            }
            if let Some(overlap) = overlap {
                settings.rag.chunk_overlap = overlap;
            }
            let pipeline = build_pipeline(&settings, false)?;

            pipeline.initialize(recreate).await?;
            let report = pipeline
                .ingest_directory(&dir)
                .await
                .with_context(|| format!("failed to ingest {}", dir.display()))?;
            println!(
                "Ingested {} documents as {} chunks ({} stored) into '{}'",
                report.documents, report.chunks, report.stored, settings.collection.name
            );
        }
        Commands::Search { query, top_k } => {
            let pipeline = build_pipeline(&settings, false)?;
            let top_k = top_k.unwrap_or(settings.rag.top_k);
            let results = pipeline.query_with_top_k(&query, top_k).await?;
            print_results(&results);
        }
        Commands::Ask { question, top_k, show_context } => {
            let pipeline = build_pipeline(&settings, true)?;
            let top_k = top_k.unwrap_or(settings.rag.top_k);
            let answer = pipeline.answer_with_top_k(&question, top_k).await?;

            if show_context {
                println!("Context:\n{}\n", answer.context_used);
            }
            println!("{}", answer.answer);
            if !answer.sources.is_empty() {
                println!("\nSources: {}", answer.sources.join(", "));
            }
        }
        Commands::Status => {
            let pipeline = build_pipeline(&settings, false)?;
            let collection = pipeline.retriever().collection();

            println!("Qdrant:     {}", settings.services.qdrant_url);
            println!(
                "Collection: {} ({} dimensions, {:?})",
                collection.name, collection.dimensions, collection.distance
            );
            match pipeline.retriever().count().await {
                Ok(count) => println!("Chunks:     {count}"),
                Err(RagError::CollectionNotFound(_)) => {
                    println!("Chunks:     collection does not exist yet");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

/// Wire Qdrant and OpenAI into a pipeline. The chat answerer is only
/// constructed for commands that answer questions.
fn build_pipeline(settings: &Settings, with_answerer: bool) -> anyhow::Result<RagPipeline> {
    let services = &settings.services;
    let timeout = services.request_timeout();

    let store = QdrantVectorStore::new(&services.qdrant_url, timeout)
        .with_context(|| format!("failed to connect to Qdrant at {}", services.qdrant_url))?;

    let embedder = OpenAIEmbeddingProvider::from_env()?
        .with_model(&services.embedding_model)
        .with_dimensions(settings.collection.dimensions)
        .with_base_url(&services.openai_base_url)
        .with_timeout(timeout)?;

    let mut builder = RagPipeline::builder()
        .config(settings.rag.clone())
        .embedding_provider(Arc::new(embedder))
        .vector_store(Arc::new(store))
        .collection(settings.collection.clone());

    if with_answerer {
        let answerer = OpenAIChatAnswerer::from_env()?
            .with_model(&services.chat_model)
            .with_temperature(services.temperature)
            .with_base_url(&services.openai_base_url)
            .with_timeout(timeout)?;
        builder = builder.answerer(Arc::new(answerer));
    }

    let pipeline = builder.build()?;
    info!(collection = %settings.collection.name, "pipeline ready");
    Ok(pipeline)
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No matching chunks.");
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} (chunk {})",
            rank + 1,
            result.score,
            result.metadata.source_or_unknown(),
            result.metadata.chunk_index
        );
        println!("   {}", preview(&result.content, 160));
    }
}

/// The first `max_chars` characters of `text` on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}...")
}

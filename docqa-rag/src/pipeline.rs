//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the full ingest-and-answer workflow by
//! composing a [`Chunker`], a [`Retriever`] (embedder + vector store), and an
//! optional [`Answerer`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagPipeline, RagConfig, InMemoryVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .answerer(Arc::new(my_answerer))
//!     .build()?;
//!
//! pipeline.initialize(false).await?;
//! pipeline.ingest_directory("data/sample_docs").await?;
//! let answer = pipeline.answer("What is machine learning?").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::answer::{Answer, Answerer, build_prompt};
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::context::build_context;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::load_documents;
use crate::retriever::Retriever;
use crate::vectorstore::{CollectionConfig, VectorStore};

/// Counts from one ingestion run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents read.
    pub documents: usize,
    /// Chunks produced by the chunker.
    pub chunks: usize,
    /// Points written to the vector store.
    pub stored: usize,
}

/// The RAG pipeline orchestrator.
///
/// Coordinates document ingestion (load → chunk → embed → store) and
/// question answering (embed → search → assemble context → answer).
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    retriever: Retriever,
    chunker: Arc<dyn Chunker>,
    answerer: Option<Arc<dyn Answerer>>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Create the collection if absent, or reset it when `recreate` is set.
    pub async fn initialize(&self, recreate: bool) -> Result<()> {
        self.retriever.initialize_collection(recreate).await
    }

    /// Chunk, embed, and store in-memory documents.
    ///
    /// # Errors
    ///
    /// Returns the first embedding or storage failure; nothing is reported
    /// as stored when the store call fails.
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<IngestReport> {
        let chunks: Vec<Chunk> = documents.iter().flat_map(|doc| self.chunker.chunk(doc)).collect();
        let chunk_count = chunks.len();

        let embedded = self.retriever.embed_chunks(chunks).await?;
        let stored = self.retriever.store(&embedded).await?;

        let report = IngestReport { documents: documents.len(), chunks: chunk_count, stored };
        info!(
            documents = report.documents,
            chunks = report.chunks,
            stored = report.stored,
            "ingested documents"
        );
        Ok(report)
    }

    /// Load every `.txt` file under `dir` and ingest it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the directory or a file cannot be read,
    /// otherwise as [`ingest_documents`](Self::ingest_documents).
    pub async fn ingest_directory(&self, dir: impl AsRef<Path>) -> Result<IngestReport> {
        let documents = load_documents(dir)?;
        self.ingest_documents(&documents).await
    }

    /// Retrieve the configured `top_k` chunks most relevant to `question`.
    pub async fn query(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.query_with_top_k(question, self.config.top_k).await
    }

    /// Retrieve the `top_k` chunks most relevant to `question`.
    pub async fn query_with_top_k(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let results = self.retriever.search_by_text(question, top_k).await?;
        info!(result_count = results.len(), "query completed");
        Ok(results)
    }

    /// Answer `question` from the configured `top_k` retrieved chunks.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_with_top_k(question, self.config.top_k).await
    }

    /// Answer `question` from the `top_k` retrieved chunks.
    ///
    /// The context is capped at `max_context_length`; `sources` lists the
    /// distinct sources of all retrieved chunks in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no answerer is configured, and
    /// retrieval or answerer failures otherwise.
    pub async fn answer_with_top_k(&self, question: &str, top_k: usize) -> Result<Answer> {
        let answerer = self
            .answerer
            .as_ref()
            .ok_or_else(|| RagError::ConfigError("no answerer configured".to_string()))?;

        let results = self.query_with_top_k(question, top_k).await?;
        let context = build_context(&results, self.config.max_context_length);
        let prompt = build_prompt(&context, question);

        let answer = answerer
            .complete(&prompt)
            .await
            .inspect_err(|e| error!(error = %e, "answer generation failed"))?;

        let mut sources: Vec<String> = Vec::new();
        for result in &results {
            let source = result.metadata.source_or_unknown();
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }

        info!(source_count = sources.len(), context_len = context.len(), "answered question");
        Ok(Answer { answer, sources, context_used: context })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `embedding_provider` and `vector_store` are required. The collection
/// defaults to `documents` with the provider's dimension, the chunker to a
/// [`FixedSizeChunker`] using the configured window, and the answerer is
/// optional (retrieval-only pipelines).
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .collection(CollectionConfig::new("documents", 1536))
///     .answerer(Arc::new(answerer))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    collection: Option<CollectionConfig>,
    chunker: Option<Arc<dyn Chunker>>,
    answerer: Option<Arc<dyn Answerer>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the target collection.
    pub fn collection(mut self, collection: CollectionConfig) -> Self {
        self.collection = Some(collection);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the answerer used by [`RagPipeline::answer`].
    pub fn answerer(mut self, answerer: Arc<dyn Answerer>) -> Self {
        self.answerer = Some(answerer);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing, the
    /// configuration is inconsistent, or the collection dimension differs
    /// from the embedding provider's.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;

        let collection = self.collection.unwrap_or_else(|| {
            CollectionConfig::new(CollectionConfig::default().name, embedding_provider.dimensions())
        });
        if collection.dimensions != embedding_provider.dimensions() {
            return Err(RagError::ConfigError(format!(
                "collection '{}' has dimension {} but the embedding provider produces {}",
                collection.name,
                collection.dimensions,
                embedding_provider.dimensions()
            )));
        }

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        let retriever = Retriever::new(embedding_provider, vector_store, collection)
            .with_embedding_batch_size(config.embedding_batch_size);

        Ok(RagPipeline { config, retriever, chunker, answerer: self.answerer })
    }
}

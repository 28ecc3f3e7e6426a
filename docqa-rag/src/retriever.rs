//! Storage and similarity search of embedded chunks.
//!
//! The [`Retriever`] binds an [`EmbeddingProvider`] and a [`VectorStore`] to
//! one [`CollectionConfig`]. It validates vector dimensions locally before
//! any store call, assigns deterministic point ids, and turns text queries
//! into ranked [`SearchResult`]s.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{Chunk, EmbeddedChunk, Point, SearchResult};
use crate::embedding::{EmbeddingProvider, embed_in_batches};
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionConfig, VectorStore};

/// Stores embedded chunks in, and searches, a single collection.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{CollectionConfig, InMemoryVectorStore, Retriever};
///
/// let retriever = Retriever::new(embedder, Arc::new(InMemoryVectorStore::new()),
///     CollectionConfig::new("documents", 1536));
/// let stored = retriever.store(&embedded_chunks).await?;
/// let results = retriever.search_by_text("what is machine learning?", 5).await?;
/// ```
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection: CollectionConfig,
    embedding_batch_size: usize,
}

impl Retriever {
    /// Default number of texts per embedding request.
    pub const DEFAULT_BATCH_SIZE: usize = 100;

    /// Create a retriever over `collection`.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        collection: CollectionConfig,
    ) -> Self {
        Self {
            embedding_provider,
            vector_store,
            collection,
            embedding_batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the number of texts per embedding request.
    pub fn with_embedding_batch_size(mut self, batch_size: usize) -> Self {
        self.embedding_batch_size = batch_size;
        self
    }

    /// The collection this retriever reads and writes.
    pub fn collection(&self) -> &CollectionConfig {
        &self.collection
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create the collection if absent, or drop and recreate it when
    /// `recreate` is set.
    pub async fn initialize_collection(&self, recreate: bool) -> Result<()> {
        let name = &self.collection.name;
        if recreate {
            self.vector_store.recreate_collection(&self.collection).await?;
            info!(collection = %name, "recreated collection");
        } else {
            self.vector_store.create_collection(&self.collection).await?;
            debug!(collection = %name, "ensured collection exists");
        }
        Ok(())
    }

    /// Number of points currently stored in the collection.
    pub async fn count(&self) -> Result<usize> {
        self.vector_store.count(&self.collection.name).await
    }

    /// Embed chunk contents in batches and pair each vector with its chunk.
    ///
    /// # Errors
    ///
    /// Propagates embedder failures; a provider returning the wrong number
    /// of vectors is an [`RagError::EmbeddingError`].
    pub async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings =
            embed_in_batches(self.embedding_provider.as_ref(), &texts, self.embedding_batch_size)
                .await
                .inspect_err(|e| error!(error = %e, "embedding failed during ingestion"))?;

        debug!(chunk_count = chunks.len(), "embedded chunks");
        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect())
    }

    /// Store embedded chunks as points and return how many were written.
    ///
    /// Every embedding is checked against the collection dimension before
    /// anything is sent. The collection is created if absent, then all
    /// points are upserted in one batch. Point ids are derived from each
    /// chunk's source, index, and content, so storing the same chunks again
    /// overwrites rather than duplicates.
    ///
    /// Empty input returns 0 without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] naming the first offending
    /// chunk, or the store's error if creation or the upsert fails. A failed
    /// upsert may have written some points; retrying is safe.
    pub async fn store(&self, chunks: &[EmbeddedChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let expected = self.collection.dimensions;
        if let Some((index, chunk)) =
            chunks.iter().enumerate().find(|(_, c)| c.embedding.len() != expected)
        {
            let actual = chunk.embedding.len();
            error!(index, expected, actual, "embedding dimension mismatch");
            return Err(RagError::DimensionMismatch { index, expected, actual });
        }

        self.vector_store.create_collection(&self.collection).await?;

        let points: Vec<Point> = chunks.iter().cloned().map(EmbeddedChunk::into_point).collect();
        let name = &self.collection.name;
        self.vector_store.upsert(name, &points).await.inspect_err(|e| {
            error!(collection = %name, error = %e, "upsert failed");
        })?;

        info!(collection = %name, count = points.len(), "stored chunks");
        Ok(points.len())
    }

    /// Return up to `top_k` stored chunks most similar to `query_vector`,
    /// by descending score.
    ///
    /// Equal scores come back in a backend-defined order.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] if `top_k == 0`
    /// - [`RagError::QueryDimensionMismatch`] if the vector length is not the
    ///   collection dimension
    /// - [`RagError::CollectionNotFound`] if the collection does not exist
    pub async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::Validation("top_k must be at least 1".to_string()));
        }
        if query_vector.len() != self.collection.dimensions {
            return Err(RagError::QueryDimensionMismatch {
                expected: self.collection.dimensions,
                actual: query_vector.len(),
            });
        }

        let name = &self.collection.name;
        let results = self.vector_store.query(name, query_vector, top_k).await.inspect_err(|e| {
            error!(collection = %name, error = %e, "vector store search failed");
        })?;

        debug!(collection = %name, top_k, result_count = results.len(), "search completed");
        Ok(results)
    }

    /// Embed `query` and [`search`](Self::search) with the resulting vector.
    pub async fn search_by_text(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::Validation("top_k must be at least 1".to_string()));
        }
        let query_vector = self
            .embedding_provider
            .embed(query)
            .await
            .inspect_err(|e| error!(error = %e, "embedding failed during query"))?;
        self.search(&query_vector, top_k).await
    }
}

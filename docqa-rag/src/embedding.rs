//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str {
        "embedder"
    }
}

/// Embed `texts` in sequential batches of at most `batch_size` inputs.
///
/// Batch `i + 1` is only sent once batch `i` has returned, and the output
/// preserves input order.
///
/// # Errors
///
/// Returns [`RagError::Validation`] if `batch_size` is zero, the provider's
/// error if any batch fails, and [`RagError::EmbeddingError`] if a batch
/// returns a different number of vectors than it was given.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    if batch_size == 0 {
        return Err(RagError::Validation("embedding batch_size must be greater than zero".into()));
    }

    let mut embeddings = Vec::with_capacity(texts.len());
    for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
        debug!(provider = provider.name(), batch_index, batch_size = batch.len(), "embedding batch");
        let vectors = provider.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(RagError::EmbeddingError {
                provider: provider.name().to_string(),
                message: format!(
                    "batch {batch_index} returned {} embeddings for {} inputs",
                    vectors.len(),
                    batch.len()
                ),
            });
        }
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

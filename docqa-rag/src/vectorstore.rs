//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Point, SearchResult};
use crate::error::{RagError, Result};

/// Similarity metric of a collection. Scores are always "higher is more similar".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Cosine similarity in `[-1, 1]`.
    #[default]
    Cosine,
    /// Raw dot product.
    Dot,
}

impl Distance {
    /// Score two equal-length vectors under this metric.
    ///
    /// Cosine similarity is 0.0 if either vector has zero magnitude.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        match self {
            Self::Dot => dot,
            Self::Cosine => {
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 0.0;
                }
                dot / (norm_a * norm_b)
            }
        }
    }
}

impl std::str::FromStr for Distance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            other => Err(format!("unknown distance metric '{other}' (expected cosine or dot)")),
        }
    }
}

/// Name, dimension, and metric of a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Collection name.
    pub name: String,
    /// Length of every vector stored in the collection.
    pub dimensions: usize,
    /// Similarity metric used to rank query results.
    pub distance: Distance,
}

impl CollectionConfig {
    /// A cosine collection with the given name and dimension.
    pub fn new(name: impl Into<String>, dimensions: usize) -> Self {
        Self { name: name.into(), dimensions, distance: Distance::Cosine }
    }

    /// Set the similarity metric.
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self::new("documents", 1536)
    }
}

/// Check every point against the collection dimension before anything is written.
///
/// # Errors
///
/// Returns [`RagError::DimensionMismatch`] naming the first offending point.
pub fn check_point_dimensions(points: &[Point], expected: usize) -> Result<()> {
    match points.iter().enumerate().find(|(_, p)| p.vector.len() != expected) {
        Some((index, point)) => {
            Err(RagError::DimensionMismatch { index, expected, actual: point.vector.len() })
        }
        None => Ok(()),
    }
}

/// Check a query vector against the collection dimension.
///
/// # Errors
///
/// Returns [`RagError::QueryDimensionMismatch`] if the lengths differ.
pub fn check_query_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(RagError::QueryDimensionMismatch { expected, actual: vector.len() });
    }
    Ok(())
}

/// A storage backend for vector points with similarity search.
///
/// Implementations manage named collections of [`Point`]s. Upserts are keyed
/// by point id, so repeating a write is safe.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{CollectionConfig, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection(&CollectionConfig::new("docs", 384)).await?;
/// store.upsert("docs", &points).await?;
/// let results = store.query("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a collection. No-op if it already exists.
    async fn create_collection(&self, config: &CollectionConfig) -> Result<()>;

    /// Delete a collection and all its points. No-op if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Drop the collection if present and create it empty.
    async fn recreate_collection(&self, config: &CollectionConfig) -> Result<()> {
        if self.collection_exists(&config.name).await? {
            self.delete_collection(&config.name).await?;
        }
        self.create_collection(config).await
    }

    /// Insert or overwrite points by id.
    ///
    /// Fails with [`RagError::CollectionNotFound`] if the collection is
    /// missing and [`RagError::DimensionMismatch`] if any point's vector
    /// length differs from the collection dimension; in both cases nothing
    /// is written.
    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()>;

    /// Return up to `limit` points most similar to `vector`, by descending score.
    ///
    /// An empty collection yields an empty result; a missing collection is
    /// [`RagError::CollectionNotFound`] and a vector of the wrong length is
    /// [`RagError::QueryDimensionMismatch`].
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of points in the collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

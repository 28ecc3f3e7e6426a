//! In-memory vector store.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small-scale use cases.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Point, PointId, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{
    CollectionConfig, VectorStore, check_point_dimensions, check_query_dimension,
};

#[derive(Debug)]
struct Collection {
    config: CollectionConfig,
    points: HashMap<PointId, Point>,
}

/// An in-memory vector store with exact (brute-force) search.
///
/// Collections are stored as nested `HashMap`s: collection name → point ID → point.
/// Vector lengths are checked against the collection dimension on every
/// write and query. Equal scores are ordered by point id.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{CollectionConfig, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection(&CollectionConfig::new("docs", 384)).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, config: &CollectionConfig) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(config.name.clone()).or_insert_with(|| {
            debug!(collection = %config.name, dimensions = config.dimensions, "created in-memory collection");
            Collection { config: config.clone(), points: HashMap::new() }
        });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().await.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;

        check_point_dimensions(points, store.config.dimensions)?;

        for point in points {
            store.points.insert(point.id.clone(), point.clone());
        }
        debug!(collection, count = points.len(), "upserted points in memory");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let store = collections
            .get(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;

        check_query_dimension(vector, store.config.dimensions)?;

        let distance = store.config.distance;
        let mut scored: Vec<(f32, &Point)> =
            store.points.values().map(|p| (distance.score(&p.vector, vector), p)).collect();

        scored.sort_by(|(sa, pa), (sb, pb)| {
            sb.partial_cmp(sa).unwrap_or(Ordering::Equal).then_with(|| pa.id.cmp(&pb.id))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, point)| SearchResult::from_payload(point.payload.clone(), score))
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.points.len())
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))
    }
}

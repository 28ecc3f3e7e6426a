//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::new("http://localhost:6334", Duration::from_secs(30))?;
//! store.create_collection(&CollectionConfig::new("docs", 1536)).await?;
//! store.upsert("docs", &points).await?;
//! let results = store.query("docs", &query_embedding, 5).await?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfig;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance as QdrantDistance, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload as QdrantPayload, Qdrant, QdrantError};
use tracing::{debug, error};

use crate::document::{Payload, Point, PointId, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{
    CollectionConfig, Distance, VectorStore, check_point_dimensions, check_query_dimension,
};

const BACKEND: &str = "qdrant";

// gRPC status codes, as numbered by `tonic::Code`.
const CODE_CANCELLED: i32 = 1;
const CODE_DEADLINE_EXCEEDED: i32 = 4;
const CODE_UNAVAILABLE: i32 = 14;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Wraps a [`qdrant_client::Qdrant`] client. Point payloads hold the chunk
/// `content` and its `metadata` object.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given gRPC URL.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Qdrant::from_url(url).timeout(timeout).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: QdrantError) -> RagError {
        error!(backend = BACKEND, error = %e, "qdrant request failed");
        match &e {
            QdrantError::ResponseError { status } => {
                classify_status(status.code() as i32, status.message(), e.to_string())
            }
            QdrantError::ResourceExhaustedError { .. } => {
                RagError::RateLimited { provider: BACKEND.to_string(), message: e.to_string() }
            }
            QdrantError::InvalidUri(_) => RagError::ConfigError(e.to_string()),
            _ => store_error(e.to_string()),
        }
    }

    async fn ensure_exists(&self, collection: &str) -> Result<()> {
        if self.collection_exists(collection).await? {
            Ok(())
        } else {
            Err(RagError::CollectionNotFound(collection.to_string()))
        }
    }

    /// The vector size the collection was created with.
    async fn collection_dimension(&self, collection: &str) -> Result<usize> {
        self.ensure_exists(collection).await?;
        let response = self.client.collection_info(collection).await.map_err(Self::map_err)?;
        let config = response
            .result
            .and_then(|info| info.config)
            .and_then(|config| config.params)
            .and_then(|params| params.vectors_config)
            .and_then(|vectors| vectors.config);
        match config {
            Some(VectorsConfig::Params(params)) => Ok(params.size as usize),
            Some(VectorsConfig::ParamsMap(_)) => Err(store_error(format!(
                "collection '{collection}' uses named vectors, which are not supported"
            ))),
            None => {
                Err(store_error(format!("collection '{collection}' reports no vector config")))
            }
        }
    }

    fn to_qdrant_id(id: &PointId) -> qdrant_client::qdrant::PointId {
        match id {
            PointId::Num(n) => (*n).into(),
            PointId::Uuid(s) => s.clone().into(),
        }
    }

    fn to_payload(payload: &Payload) -> Result<QdrantPayload> {
        let value = serde_json::to_value(payload)
            .map_err(|e| store_error(format!("failed to encode payload: {e}")))?;
        QdrantPayload::try_from(value).map_err(Self::map_err)
    }

    /// Decode a stored point payload into chunk content and metadata.
    fn from_payload(payload: &HashMap<String, QdrantValue>) -> Result<Payload> {
        let object: serde_json::Map<String, serde_json::Value> =
            payload.iter().map(|(k, v)| (k.clone(), Self::to_json(v))).collect();
        serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| store_error(format!("failed to decode payload: {e}")))
    }

    /// Convert a Qdrant payload value back into JSON.
    fn to_json(value: &QdrantValue) -> serde_json::Value {
        match &value.kind {
            Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
            Some(Kind::IntegerValue(i)) => serde_json::Value::from(*i),
            Some(Kind::DoubleValue(d)) => serde_json::Value::from(*d),
            Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
            Some(Kind::StructValue(s)) => serde_json::Value::Object(
                s.fields.iter().map(|(k, v)| (k.clone(), Self::to_json(v))).collect(),
            ),
            Some(Kind::ListValue(l)) => {
                serde_json::Value::Array(l.values.iter().map(Self::to_json).collect())
            }
            Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client.collection_exists(name).await.map_err(Self::map_err)
    }

    async fn create_collection(&self, config: &CollectionConfig) -> Result<()> {
        if self.collection_exists(&config.name).await? {
            debug!(collection = %config.name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        let distance = match config.distance {
            Distance::Cosine => QdrantDistance::Cosine,
            Distance::Dot => QdrantDistance::Dot,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(config.name.as_str())
                    .vectors_config(VectorParamsBuilder::new(config.dimensions as u64, distance)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %config.name, dimensions = config.dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.collection_exists(name).await? {
            return Ok(());
        }
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let dimensions = self.collection_dimension(collection).await?;
        check_point_dimensions(points, dimensions)?;

        let qdrant_points = points
            .iter()
            .map(|point| {
                Ok(PointStruct::new(
                    Self::to_qdrant_id(&point.id),
                    point.vector.clone(),
                    Self::to_payload(&point.payload)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = points.len(), "upserted points to qdrant");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let dimensions = self.collection_dimension(collection).await?;
        check_query_dimension(vector, dimensions)?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        response
            .result
            .into_iter()
            .map(|scored| {
                let payload = Self::from_payload(&scored.payload).map_err(|e| {
                    let id = scored.id.and_then(|pid| pid.point_id_options).map(|opt| match opt {
                        PointIdOptions::Num(n) => n.to_string(),
                        PointIdOptions::Uuid(s) => s,
                    });
                    error!(collection, ?id, error = %e, "stored point has an unreadable payload");
                    store_error(format!("point {}: {e}", id.unwrap_or_default()))
                })?;
                Ok(SearchResult::from_payload(payload, scored.score))
            })
            .collect()
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.ensure_exists(collection).await?;
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(Self::map_err)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or_default())
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message }
}

/// Map a gRPC status to an error. Connection failures mean the configured
/// address is wrong or the server is down, so they are not retried.
fn classify_status(code: i32, message: &str, detail: String) -> RagError {
    let connect_failed = message.contains("Failed to connect") || message.contains("connect error");
    if code == CODE_UNAVAILABLE || connect_failed {
        RagError::StoreUnreachable { backend: BACKEND.to_string(), message: detail }
    } else if code == CODE_DEADLINE_EXCEEDED || code == CODE_CANCELLED {
        RagError::ServiceUnavailable { provider: BACKEND.to_string(), message: detail }
    } else {
        store_error(detail)
    }
}

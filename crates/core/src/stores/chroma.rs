use crate::models::{Candidate, DocumentMetadata};
use crate::traits::VectorIndex;
use crate::StoreError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;

pub const DEFAULT_COLLECTION: &str = "job_listings_v1";

/// HTTP wrapper around a Chroma collection.
///
/// The collection id is resolved lazily via get-or-create and cached for
/// the life of the store. Any backend failure clears the cache so the
/// next call retries initialization instead of reusing a bad handle.
pub struct ChromaStore {
    client: Client,
    endpoint: String,
    collection: String,
    collection_id: Mutex<Option<String>>,
}

impl ChromaStore {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            collection: collection.into(),
            collection_id: Mutex::new(None),
        }
    }

    /// Cheap reachability probe; safe to call repeatedly.
    pub async fn connect(&self) -> Result<(), StoreError> {
        self.client
            .get(format!("{}/api/v1/heartbeat", self.endpoint))
            .send()
            .await
            .map_err(|error| StoreError::Connection(error.to_string()))?;
        Ok(())
    }

    async fn collection_id(&self) -> Result<String, StoreError> {
        let mut cached = self.collection_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let response = self
            .client
            .post(format!("{}/api/v1/collections", self.endpoint))
            .json(&json!({
                "name": self.collection,
                "metadata": { "hnsw:space": "cosine" },
                "get_or_create": true,
            }))
            .send()
            .await
            .map_err(|error| StoreError::Collection(error.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Collection(format!(
                "get-or-create {} returned {}",
                self.collection,
                response.status()
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|error| StoreError::Collection(error.to_string()))?;
        let id = parsed
            .pointer("/id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StoreError::Collection("collection response is missing an id".to_string())
            })?
            .to_string();

        info!(collection = %self.collection, "chroma collection ready");
        *cached = Some(id.clone());
        Ok(id)
    }

    async fn invalidate_collection(&self) {
        let mut cached = self.collection_id.lock().await;
        *cached = None;
    }

    async fn backend_failure(&self, details: String) -> StoreError {
        // The cached handle may be stale (collection dropped or recreated
        // server-side); force re-initialization on the next call.
        self.invalidate_collection().await;
        StoreError::Backend {
            backend: "chroma".to_string(),
            details,
        }
    }

    async fn get(&self, ids: &[String], include: &[&str]) -> Result<Value, StoreError> {
        let collection_id = self.collection_id().await?;
        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/get",
                self.endpoint, collection_id
            ))
            .json(&json!({ "ids": ids, "include": include }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.backend_failure(response.status().to_string()).await);
        }

        Ok(response.json().await?)
    }

    /// Positions of the requested ids inside the store's found-only reply.
    fn align_positions(ids: &[String], parsed: &Value) -> Vec<Option<usize>> {
        let found: HashMap<&str, usize> = parsed
            .pointer("/ids")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .enumerate()
                    .filter_map(|(position, value)| value.as_str().map(|id| (id, position)))
                    .collect()
            })
            .unwrap_or_default();

        ids.iter().map(|id| found.get(id.as_str()).copied()).collect()
    }
}

#[async_trait]
impl VectorIndex for ChromaStore {
    async fn upsert(
        &self,
        ids: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[DocumentMetadata],
        documents: &[String],
    ) -> Result<(), StoreError> {
        if ids.len() != vectors.len() || ids.len() != metadatas.len() || ids.len() != documents.len()
        {
            return Err(StoreError::Request(format!(
                "upsert arrays are misaligned: {} ids, {} vectors, {} metadatas, {} documents",
                ids.len(),
                vectors.len(),
                metadatas.len(),
                documents.len()
            )));
        }

        if ids.is_empty() {
            return Ok(());
        }

        let collection_id = self.collection_id().await?;
        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/upsert",
                self.endpoint, collection_id
            ))
            .json(&json!({
                "ids": ids,
                "embeddings": vectors,
                "metadatas": metadatas,
                "documents": documents,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.backend_failure(response.status().to_string()).await);
        }

        Ok(())
    }

    async fn get_vectors(&self, ids: &[String]) -> Result<Vec<Option<Vec<f32>>>, StoreError> {
        let parsed = self.get(ids, &["embeddings"]).await?;
        let embeddings = parsed
            .pointer("/embeddings")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(Self::align_positions(ids, &parsed)
            .into_iter()
            .map(|position| {
                position
                    .and_then(|index| embeddings.get(index))
                    .and_then(|value| serde_json::from_value::<Vec<f32>>(value.clone()).ok())
            })
            .collect())
    }

    async fn get_documents(&self, ids: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let parsed = self.get(ids, &["documents"]).await?;
        let documents = parsed
            .pointer("/documents")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(Self::align_positions(ids, &parsed)
            .into_iter()
            .map(|position| {
                position
                    .and_then(|index| documents.get(index))
                    .and_then(Value::as_str)
                    .map(|text| text.to_string())
            })
            .collect())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>, StoreError> {
        let collection_id = self.collection_id().await?;
        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.endpoint, collection_id
            ))
            .json(&json!({
                "query_embeddings": [vector],
                "n_results": k,
                "include": ["metadatas", "documents", "distances"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.backend_failure(response.status().to_string()).await);
        }

        let parsed: Value = response.json().await?;
        let ids = parsed
            .pointer("/ids/0")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let metadatas = parsed
            .pointer("/metadatas/0")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let documents = parsed
            .pointer("/documents/0")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let distances = parsed
            .pointer("/distances/0")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut candidates = Vec::new();
        for (rank, id) in ids.iter().enumerate() {
            let id = id.as_str().unwrap_or_default().to_string();
            let metadata = metadatas
                .get(rank)
                .and_then(|value| serde_json::from_value(value.clone()).ok())
                .unwrap_or_default();
            let document = documents
                .get(rank)
                .and_then(Value::as_str)
                .map(|text| text.to_string());
            let distance = distances.get(rank).and_then(Value::as_f64).unwrap_or(0.0);

            candidates.push(Candidate {
                id,
                metadata,
                document,
                rank,
                distance,
            });
        }

        Ok(candidates)
    }
}

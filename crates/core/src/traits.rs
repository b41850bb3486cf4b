use crate::{Candidate, DocumentMetadata, EmbedError, StoreError};
use async_trait::async_trait;

#[async_trait]
pub trait Embedder {
    /// Embeds a single text. Rejects blank input before any network call.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embeds texts in chunks of at most `batch_size`, one provider call
    /// per chunk. Output is index-aligned with the input; positions in a
    /// failed chunk (or unmatched within a chunk) hold `None` instead of
    /// aborting the whole batch.
    async fn embed_batch(&self, texts: &[String], batch_size: usize) -> Vec<Option<Vec<f32>>>;
}

#[async_trait]
pub trait VectorIndex {
    /// Inserts or overwrites records by id. All slices must be index-aligned.
    async fn upsert(
        &self,
        ids: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[DocumentMetadata],
        documents: &[String],
    ) -> Result<(), StoreError>;

    /// Stored vectors aligned to the requested ids; `None` for ids not found.
    async fn get_vectors(&self, ids: &[String]) -> Result<Vec<Option<Vec<f32>>>, StoreError>;

    /// Stored document texts aligned to the requested ids; `None` for ids not found.
    async fn get_documents(&self, ids: &[String]) -> Result<Vec<Option<String>>, StoreError>;

    /// Up to `k` nearest neighbours ordered by ascending distance.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Candidate>, StoreError>;
}

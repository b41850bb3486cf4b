use crate::models::Candidate;
use crate::traits::{Embedder, VectorIndex};
use crate::RetrieveError;
use tracing::warn;

/// Similarity retrieval over the vector store, by free text or by the id
/// of an already-indexed listing.
pub struct Retriever<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    embedder: E,
    store: V,
}

impl<E, V> Retriever<E, V>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, store: V) -> Self {
        Self { embedder, store }
    }

    /// Embeds `text` and returns up to `k` candidates in rank order.
    /// Hits without an id are dropped.
    pub async fn query_by_text(&self, text: &str, k: usize) -> Result<Vec<Candidate>, RetrieveError> {
        let vector = self.embedder.embed_one(text).await?;
        let hits = self.store.query(&vector, k).await?;
        Ok(hits.into_iter().filter(|hit| !hit.id.is_empty()).collect())
    }

    /// Finds listings similar to an already-indexed one.
    ///
    /// Uses the stored vector when present. When the vector is gone but
    /// the document text survives, the text is re-embedded and used
    /// instead; when neither exists the lookup fails with `NotFound`.
    pub async fn query_by_source_id(
        &self,
        source_id: &str,
        k: usize,
        exclude_self: bool,
    ) -> Result<Vec<Candidate>, RetrieveError> {
        let ids = vec![source_id.to_string()];
        let stored = self
            .store
            .get_vectors(&ids)
            .await?
            .into_iter()
            .next()
            .flatten();

        let vector = match stored {
            Some(vector) => vector,
            None => {
                warn!(source_id, "stored vector missing; re-embedding document text");
                let document = self
                    .store
                    .get_documents(&ids)
                    .await?
                    .into_iter()
                    .next()
                    .flatten()
                    .ok_or_else(|| RetrieveError::NotFound(source_id.to_string()))?;
                self.embedder.embed_one(&document).await?
            }
        };

        // Over-fetch by one so dropping the source itself cannot leave the
        // caller short.
        let limit = if exclude_self { k + 1 } else { k };
        let hits = self.store.query(&vector, limit).await?;

        let mut candidates: Vec<Candidate> =
            hits.into_iter().filter(|hit| !hit.id.is_empty()).collect();
        if exclude_self {
            candidates.retain(|hit| hit.id != source_id);
            candidates.truncate(k);
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentMetadata;
    use crate::{EmbedError, StoreError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbedder {
        embed_calls: AtomicUsize,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self {
                embed_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            if text.trim().is_empty() {
                return Err(EmbedError::EmptyInput);
            }
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.1, 0.2, 0.3])
        }

        async fn embed_batch(
            &self,
            texts: &[String],
            _batch_size: usize,
        ) -> Vec<Option<Vec<f32>>> {
            texts.iter().map(|_| Some(vec![0.1, 0.2, 0.3])).collect()
        }
    }

    struct FakeStore {
        vectors: HashMap<String, Vec<f32>>,
        documents: HashMap<String, String>,
        hits: Vec<Candidate>,
    }

    impl FakeStore {
        fn with_hits(hits: Vec<Candidate>) -> Self {
            Self {
                vectors: HashMap::new(),
                documents: HashMap::new(),
                hits,
            }
        }
    }

    fn hit(id: &str, rank: usize) -> Candidate {
        Candidate {
            id: id.to_string(),
            metadata: DocumentMetadata::default(),
            document: Some(format!("body of {id}")),
            rank,
            distance: rank as f64 * 0.1,
        }
    }

    #[async_trait]
    impl VectorIndex for FakeStore {
        async fn upsert(
            &self,
            _ids: &[String],
            _vectors: &[Vec<f32>],
            _metadatas: &[DocumentMetadata],
            _documents: &[String],
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_vectors(&self, ids: &[String]) -> Result<Vec<Option<Vec<f32>>>, StoreError> {
            Ok(ids
                .iter()
                .map(|id| self.vectors.get(id).cloned())
                .collect())
        }

        async fn get_documents(&self, ids: &[String]) -> Result<Vec<Option<String>>, StoreError> {
            Ok(ids
                .iter()
                .map(|id| self.documents.get(id).cloned())
                .collect())
        }

        async fn query(&self, _vector: &[f32], k: usize) -> Result<Vec<Candidate>, StoreError> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }
    }

    #[tokio::test]
    async fn stored_vector_short_circuits_re_embedding() {
        let mut store = FakeStore::with_hits(vec![hit("https://example.org/a", 0)]);
        store
            .vectors
            .insert("https://example.org/src".to_string(), vec![0.5, 0.5, 0.5]);
        let retriever = Retriever::new(FakeEmbedder::new(), store);

        let candidates = retriever
            .query_by_source_id("https://example.org/src", 3, false)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(retriever.embedder.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_vector_falls_back_to_document_text() {
        let mut store = FakeStore::with_hits(vec![
            hit("https://example.org/src", 0),
            hit("https://example.org/a", 1),
            hit("https://example.org/b", 2),
            hit("https://example.org/c", 3),
        ]);
        store.documents.insert(
            "https://example.org/src".to_string(),
            "surviving document text".to_string(),
        );
        let retriever = Retriever::new(FakeEmbedder::new(), store);

        let candidates = retriever
            .query_by_source_id("https://example.org/src", 3, true)
            .await
            .unwrap();

        assert_eq!(retriever.embedder.embed_calls.load(Ordering::SeqCst), 1);
        assert!(candidates.len() <= 3);
        assert!(candidates
            .iter()
            .all(|candidate| candidate.id != "https://example.org/src"));
        // Rank order from the store is untouched.
        assert_eq!(candidates[0].id, "https://example.org/a");
        assert_eq!(candidates[1].id, "https://example.org/b");
    }

    #[tokio::test]
    async fn no_vector_and_no_document_is_not_found() {
        let retriever = Retriever::new(FakeEmbedder::new(), FakeStore::with_hits(Vec::new()));

        let result = retriever
            .query_by_source_id("https://example.org/gone", 3, true)
            .await;

        assert!(matches!(result, Err(RetrieveError::NotFound(_))));
    }

    #[tokio::test]
    async fn text_query_drops_hits_without_ids() {
        let store = FakeStore::with_hits(vec![hit("https://example.org/a", 0), hit("", 1)]);
        let retriever = Retriever::new(FakeEmbedder::new(), store);

        let candidates = retriever.query_by_text("rust backend", 5).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "https://example.org/a");
    }

    #[tokio::test]
    async fn blank_text_query_fails_before_the_store() {
        let retriever = Retriever::new(FakeEmbedder::new(), FakeStore::with_hits(Vec::new()));
        let result = retriever.query_by_text("   ", 5).await;
        assert!(matches!(
            result,
            Err(RetrieveError::Embed(EmbedError::EmptyInput))
        ));
    }
}

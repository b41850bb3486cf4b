use crate::embedder::batch_spans;
use crate::models::{Document, IndexReport, IndexerOptions};
use crate::traits::{Embedder, VectorIndex};
use crate::StoreError;
use tracing::{info, warn};

/// Filters scraped listings, embeds them in batches and upserts the
/// results one batch at a time, so one bad batch never aborts the rest.
pub struct DocumentIndexer<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    embedder: E,
    store: V,
    options: IndexerOptions,
}

impl<E, V> DocumentIndexer<E, V>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: E, store: V) -> Self {
        Self::with_options(embedder, store, IndexerOptions::default())
    }

    pub fn with_options(embedder: E, store: V, options: IndexerOptions) -> Self {
        Self {
            embedder,
            store,
            options,
        }
    }

    /// Indexes `documents`, returning totals across all batches.
    ///
    /// Ineligible listings and listings whose embedding chunk failed are
    /// counted as skipped and never retried within this call. A failed
    /// batch upsert is logged and skipped; only a systemic store failure
    /// (unreachable service, no collection) propagates.
    pub async fn index(
        &self,
        documents: &[Document],
        batch_size: usize,
    ) -> Result<IndexReport, StoreError> {
        let mut report = IndexReport::default();

        let eligible: Vec<&Document> = documents
            .iter()
            .filter(|document| document.is_indexable_with(&self.options.failure_sentinels))
            .collect();
        report.skipped += documents.len() - eligible.len();

        for (batch_index, span) in batch_spans(eligible.len(), batch_size).into_iter().enumerate()
        {
            if batch_index > 0 {
                if let Some(delay) = self.options.batch_delay {
                    tokio::time::sleep(delay).await;
                }
            }

            let batch = &eligible[span];
            let bodies: Vec<String> = batch
                .iter()
                .map(|document| document.body.clone().unwrap_or_default())
                .collect();
            let embeddings = self.embedder.embed_batch(&bodies, batch_size).await;

            let mut ids = Vec::new();
            let mut vectors = Vec::new();
            let mut metadatas = Vec::new();
            let mut texts = Vec::new();

            for (document, embedding) in batch.iter().zip(embeddings) {
                match embedding {
                    Some(vector) => {
                        ids.push(document.id.clone());
                        vectors.push(vector);
                        metadatas.push(document.metadata());
                        texts.push(document.body.clone().unwrap_or_default());
                    }
                    None => report.skipped += 1,
                }
            }

            if ids.is_empty() {
                continue;
            }

            match self.store.upsert(&ids, &vectors, &metadatas, &texts).await {
                Ok(()) => report.upserted += ids.len(),
                Err(error @ (StoreError::Connection(_) | StoreError::Collection(_))) => {
                    // Nothing further is recoverable without a store.
                    return Err(error);
                }
                Err(error) => {
                    warn!(batch = batch_index, %error, "batch upsert failed; continuing");
                    report.skipped += ids.len();
                }
            }
        }

        info!(
            upserted = report.upserted,
            skipped = report.skipped,
            "indexing finished"
        );
        Ok(report)
    }
}

use crate::error::EmbedError;
use crate::traits::Embedder;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::warn;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_PROVIDER_URL: &str = "https://generativelanguage.googleapis.com";

/// Embedding client for the Gemini `embedContent` endpoints.
///
/// Holds no cache: identical texts are re-embedded on every call, and
/// callers that want dedup do it themselves.
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            action,
            self.api_key
        )
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>, EmbedError> {
        let model = format!("models/{}", self.model);
        let requests: Vec<EmbedRequest<'_>> = texts
            .iter()
            .map(|text| EmbedRequest {
                model: Some(model.as_str()),
                content: Content::from_text(text),
            })
            .collect();

        let response = self
            .client
            .post(self.endpoint("batchEmbedContents"))
            .json(&BatchEmbedRequest { requests })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(EmbedError::Provider {
                status: status.to_string(),
                details: truncate_details(&details),
            });
        }

        let parsed: BatchEmbedResponse = response.json().await?;

        // Keep positional correspondence: a short or hole-ridden response
        // yields None entries rather than an error.
        let mut vectors = Vec::with_capacity(texts.len());
        for index in 0..texts.len() {
            vectors.push(
                parsed
                    .embeddings
                    .get(index)
                    .and_then(|embedding| embedding.values.clone()),
            );
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let response = self
            .client
            .post(self.endpoint("embedContent"))
            .json(&EmbedRequest {
                model: None,
                content: Content::from_text(text),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(EmbedError::Provider {
                status: status.to_string(),
                details: truncate_details(&details),
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        parsed
            .embedding
            .and_then(|embedding| embedding.values)
            .ok_or_else(|| {
                EmbedError::MalformedResponse("response is missing embedding.values".to_string())
            })
    }

    async fn embed_batch(&self, texts: &[String], batch_size: usize) -> Vec<Option<Vec<f32>>> {
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());

        for span in batch_spans(texts.len(), batch_size) {
            let chunk = &texts[span.clone()];
            match self.embed_chunk(chunk).await {
                Ok(chunk_vectors) => vectors.extend(chunk_vectors),
                Err(error) => {
                    warn!(
                        start = span.start,
                        len = chunk.len(),
                        %error,
                        "embedding chunk failed; entries marked missing"
                    );
                    vectors.extend(std::iter::repeat_with(|| None).take(chunk.len()));
                }
            }
        }

        vectors
    }
}

/// Partitions `0..n` into consecutive spans of at most `batch_size`.
pub fn batch_spans(n: usize, batch_size: usize) -> Vec<Range<usize>> {
    let step = batch_size.max(1);
    let mut spans = Vec::new();
    let mut start = 0;
    while start < n {
        let end = (start + step).min(n);
        spans.push(start..end);
        start = end;
    }
    spans
}

fn truncate_details(details: &str) -> String {
    details.chars().take(200).collect()
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    content: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn from_text(text: &'a str) -> Self {
        Self {
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Option<Vec<f32>>,
}

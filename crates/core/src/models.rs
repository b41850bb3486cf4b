use serde::{Deserialize, Serialize};

pub const SNIPPET_CHARS: usize = 150;

/// Placeholder bodies the scraper writes when a detail fetch fails.
/// Listings carrying one of these are never indexed.
pub const FAILURE_SENTINELS: [&str; 3] = [
    "Failed to fetch description",
    "No URL found for description scraping.",
    "No description available (Extractor failed).",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Canonical listing URL; doubles as the vector-store primary key.
    pub id: String,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub body: Option<String>,
}

impl Document {
    pub fn is_indexable(&self) -> bool {
        let defaults: Vec<String> = FAILURE_SENTINELS
            .iter()
            .map(|sentinel| sentinel.to_string())
            .collect();
        self.is_indexable_with(&defaults)
    }

    pub fn is_indexable_with(&self, failure_sentinels: &[String]) -> bool {
        if self.id.trim().is_empty() {
            return false;
        }
        match &self.body {
            None => false,
            Some(body) => {
                let trimmed = body.trim();
                !trimmed.is_empty()
                    && !failure_sentinels
                        .iter()
                        .any(|sentinel| trimmed.starts_with(sentinel.as_str()))
            }
        }
    }

    pub fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            title: self.title.clone(),
            organization: self.organization.clone(),
            location: self.location.clone(),
            snippet: self.body.as_deref().map(make_snippet),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

fn make_snippet(body: &str) -> String {
    let head: String = body.chars().take(SNIPPET_CHARS).collect();
    if body.chars().count() > SNIPPET_CHARS {
        format!("{head}...")
    } else {
        head
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexReport {
    pub upserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub metadata: DocumentMetadata,
    pub document: Option<String>,
    /// Zero-based position in the similarity ranking.
    pub rank: usize,
    /// Cosine distance as reported by the store; lower is closer.
    pub distance: f64,
}

impl Candidate {
    pub fn snippet(&self) -> String {
        if let Some(snippet) = &self.metadata.snippet {
            return snippet.clone();
        }
        self.document
            .as_deref()
            .map(make_snippet)
            .unwrap_or_else(|| "No snippet available.".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Listing bodies containing any of these markers are skipped.
    pub failure_sentinels: Vec<String>,
    /// Optional pause between batches to stay under provider rate limits.
    pub batch_delay: Option<std::time::Duration>,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            failure_sentinels: FAILURE_SENTINELS
                .iter()
                .map(|sentinel| sentinel.to_string())
                .collect(),
            batch_delay: None,
        }
    }
}

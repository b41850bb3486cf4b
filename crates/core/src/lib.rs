pub mod context;
pub mod embedder;
pub mod error;
pub mod indexer;
pub mod models;
pub mod report;
pub mod retriever;
pub mod stores;
pub mod traits;

pub use context::{assemble_context, NO_CONTEXT_SENTINEL, TRUNCATION_MARKER};
pub use embedder::{
    batch_spans, GeminiEmbedder, DEFAULT_EMBEDDING_MODEL, DEFAULT_PROVIDER_URL,
};
pub use error::{EmbedError, RetrieveError, StoreError};
pub use indexer::DocumentIndexer;
pub use models::{
    Candidate, Document, DocumentMetadata, IndexReport, IndexerOptions, FAILURE_SENTINELS,
    SNIPPET_CHARS,
};
pub use report::{
    market_section_specs, parse_sections, MarketReport, Report, ReportField, SectionSpec,
    SECTION_SENTINEL,
};
pub use retriever::Retriever;
pub use stores::ChromaStore;
pub use traits::{Embedder, VectorIndex};

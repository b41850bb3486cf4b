use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding input is empty or whitespace")]
    EmptyInput,

    #[error("embedding provider returned {status}: {details}")]
    Provider { status: String, details: String },

    #[error("malformed embedding payload: {0}")]
    MalformedResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector store unreachable: {0}")]
    Connection(String),

    #[error("failed to obtain collection: {0}")]
    Collection(String),

    #[error("invalid response from {backend}: {details}")]
    Backend { backend: String, details: String },

    #[error("store request failed: {0}")]
    Request(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no data for source id: {0}")]
    NotFound(String),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

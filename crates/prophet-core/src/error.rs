use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A retrieved id has no page in the loaded corpus.
    #[error("Page not found in corpus: {0}")]
    MissingPage(String),

    #[error("Malformed hit id '{id}' from index '{index}'")]
    MalformedHitId { index: String, id: String },

    #[error("{stage} failed: {source:#}")]
    Service {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn service(stage: &'static str, source: anyhow::Error) -> Self {
        Self::Service { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

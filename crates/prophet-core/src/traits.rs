use crate::types::{ChatMessage, IndexSpec, SearchHit, VectorRecord};

/// Remote or local text embedding service.
pub trait Embedder: Send + Sync {
    /// Output dimensionality requested from the service.
    fn dim(&self) -> usize;
    fn embed(&self, text: &str, model: &str) -> anyhow::Result<Vec<f32>>;
}

/// Chat-completion service.
pub trait ChatCompleter: Send + Sync {
    fn complete(&self, messages: &[ChatMessage], model: &str) -> anyhow::Result<String>;
}

/// Vector search service holding any number of named indices.
pub trait VectorIndex: Send + Sync {
    /// Creates the index if it does not exist yet.
    fn create_index(&self, spec: &IndexSpec) -> anyhow::Result<()>;
    /// Inserts records, replacing any with the same id.
    fn upsert(&self, index: &str, records: &[VectorRecord]) -> anyhow::Result<()>;
    /// Top-k hits ordered by descending score.
    fn query(&self, index: &str, vector: &[f32], top_k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

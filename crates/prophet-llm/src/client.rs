use std::sync::Arc;

use anyhow::{bail, Result};
use prophet_core::cache::{CacheKey, CachedValue, ResponseCache};
use prophet_core::traits::Embedder;

/// Newlines are collapsed to spaces before text reaches the service.
pub fn normalize_text(text: &str) -> String {
    text.replace('\n', " ")
}

/// Embedding front-end used by retrieval and index building.
///
/// Identical (normalized text, model) pairs are served from the shared
/// response cache until their entry expires. Service errors are returned
/// unchanged and never cached.
#[derive(Clone)]
pub struct EmbeddingClient {
    embedder: Arc<dyn Embedder>,
    cache: Arc<ResponseCache>,
    model: String,
}

impl EmbeddingClient {
    pub fn new(embedder: Arc<dyn Embedder>, cache: Arc<ResponseCache>, model: impl Into<String>) -> Self {
        Self { embedder, cache, model: model.into() }
    }

    pub fn dim(&self) -> usize {
        self.embedder.dim()
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_model(text, &self.model)
    }

    pub fn embed_with_model(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let text = normalize_text(text);
        let key = CacheKey::Embedding { text: text.clone(), model: model.to_string() };
        if let Some(CachedValue::Vector(vector)) = self.cache.get(&key) {
            tracing::debug!(model, "embedding cache hit");
            return Ok(vector);
        }

        let vector = self.embedder.embed(&text, model)?;
        if vector.len() != self.embedder.dim() {
            bail!(
                "embedding service returned {} dimensions, expected {}",
                vector.len(),
                self.embedder.dim()
            );
        }
        self.cache.put(key, CachedValue::Vector(vector.clone()));
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl Embedder for Recording {
        fn dim(&self) -> usize {
            2
        }

        fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            Ok(vec![1.0, 0.0])
        }
    }

    #[test]
    fn submits_normalized_text() {
        let inner = Arc::new(Recording::default());
        let client = EmbeddingClient::new(inner.clone(), Arc::new(ResponseCache::default()), "m");
        client.embed("line one\nline two").unwrap();
        assert_eq!(inner.seen.lock().unwrap().as_slice(), ["line one line two"]);
    }

    #[test]
    fn newline_variants_share_a_cache_entry() {
        let inner = Arc::new(Recording::default());
        let client = EmbeddingClient::new(inner.clone(), Arc::new(ResponseCache::default()), "m");
        client.embed("a\nb").unwrap();
        client.embed("a b").unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn model_is_part_of_the_key() {
        let inner = Arc::new(Recording::default());
        let client = EmbeddingClient::new(inner.clone(), Arc::new(ResponseCache::default()), "m");
        client.embed_with_model("same", "m").unwrap();
        client.embed_with_model("same", "other").unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}

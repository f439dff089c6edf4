use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use prophet_core::cache::ResponseCache;
use prophet_core::config::Settings;
use prophet_core::traits::Embedder;
use figment::Jail;
use prophet_llm::{get_default_embedder, use_fake_embeddings, EmbeddingClient, FakeEmbedder};

/// Counts calls that reach the "network".
struct CountingEmbedder {
    inner: FakeEmbedder,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingEmbedder {
    fn new(dim: usize) -> Self {
        Self { inner: FakeEmbedder::new(dim), calls: AtomicUsize::new(0), fail: false }
    }

    fn failing(dim: usize) -> Self {
        Self { fail: true, ..Self::new(dim) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn embed(&self, text: &str, model: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("429 Too Many Requests");
        }
        self.inner.embed(text, model)
    }
}

#[test]
fn identical_requests_within_ttl_hit_the_service_once() {
    let service = Arc::new(CountingEmbedder::new(256));
    let cache = Arc::new(ResponseCache::default());
    let client = EmbeddingClient::new(service.clone(), cache.clone(), "text-embedding-3-large");

    let first = client.embed("What caused the Equifax breach?").unwrap();
    let second = client.embed("What caused the Equifax breach?").unwrap();

    assert_eq!(service.calls(), 1, "second call must be served from cache");
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
}

#[test]
fn expired_entries_are_fetched_again() {
    let service = Arc::new(CountingEmbedder::new(16));
    let cache = Arc::new(ResponseCache::new(10, Duration::from_millis(20)));
    let client = EmbeddingClient::new(service.clone(), cache, "m");

    client.embed("page text").unwrap();
    std::thread::sleep(Duration::from_millis(40));
    client.embed("page text").unwrap();

    assert_eq!(service.calls(), 2);
}

#[test]
fn service_errors_propagate_and_are_not_cached() {
    let service = Arc::new(CountingEmbedder::failing(16));
    let cache = Arc::new(ResponseCache::default());
    let client = EmbeddingClient::new(service.clone(), cache.clone(), "m");

    let err = client.embed("q").unwrap_err();
    assert!(err.to_string().contains("429"));
    assert!(client.embed("q").is_err());
    assert_eq!(service.calls(), 2);
    assert!(cache.is_empty());
}

#[test]
fn wrong_dimension_is_rejected() {
    struct Short;
    impl Embedder for Short {
        fn dim(&self) -> usize {
            4
        }
        fn embed(&self, _text: &str, _model: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![1.0, 2.0])
        }
    }
    let client = EmbeddingClient::new(Arc::new(Short), Arc::new(ResponseCache::default()), "m");
    let err = client.embed("q").unwrap_err();
    assert!(err.to_string().contains("expected 4"));
}

#[test]
fn fake_embedder_selected_by_env() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_USE_FAKE_EMBEDDINGS", "1");
        assert!(use_fake_embeddings());
        let embedder = get_default_embedder(&Settings::default()).expect("embedder");
        assert_eq!(embedder.dim(), 256);
        assert_eq!(embedder.embed("hello", "m").unwrap().len(), 256);

        jail.set_env("APP_USE_FAKE_EMBEDDINGS", "0");
        assert!(!use_fake_embeddings());
        Ok(())
    });
}

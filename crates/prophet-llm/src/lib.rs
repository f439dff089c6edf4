//! Clients for the external model services: text embeddings (normalized and
//! cached) and chat completion.

use std::sync::Arc;

use anyhow::Result;
use prophet_core::config::Settings;
use prophet_core::traits::Embedder;

pub mod client;
pub mod fake;
pub mod openai;

pub use client::{normalize_text, EmbeddingClient};
pub use fake::FakeEmbedder;
pub use openai::OpenAiClient;

/// `APP_USE_FAKE_EMBEDDINGS=1` swaps the remote service for the
/// deterministic hashing embedder.
pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() {
        tracing::info!(dim = settings.embedding.dimension, "using fake embedder");
        return Ok(Arc::new(FakeEmbedder::new(settings.embedding.dimension)));
    }
    let client = OpenAiClient::from_settings(&settings.api, settings.embedding.dimension)?;
    Ok(Arc::new(client))
}

//! OpenAI-compatible HTTP client for `/embeddings` and `/chat/completions`.
//!
//! Any service speaking the same wire format (hosted or local) works by
//! pointing `api.base_url` at it.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use prophet_core::config::ApiSettings;
use prophet_core::traits::{ChatCompleter, Embedder};
use prophet_core::types::ChatMessage;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    dimensions: usize,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, dimensions: usize, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url, api_key: api_key.into(), dimensions })
    }

    /// Reads the API key from the environment variable named in settings.
    pub fn from_settings(api: &ApiSettings, dimensions: usize) -> Result<Self> {
        let api_key = std::env::var(&api.api_key_env)
            .with_context(|| format!("{} is not set", api.api_key_env))?;
        Self::new(&api.base_url, api_key, dimensions, Duration::from_secs(api.timeout_secs))
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("{url} returned {status}: {body}"));
        }
        Ok(response)
    }
}

impl Embedder for OpenAiClient {
    fn dim(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest { input: text, model, dimensions: self.dimensions };
        let response: EmbeddingResponse = self
            .post("embeddings", &request)?
            .json()
            .context("malformed embeddings response")?;
        first_embedding(response)
    }
}

impl ChatCompleter for OpenAiClient {
    fn complete(&self, messages: &[ChatMessage], model: &str) -> Result<String> {
        let request = ChatRequest { model, messages };
        tracing::debug!(model, messages = messages.len(), "chat completion request");
        let response: ChatResponse = self
            .post("chat/completions", &request)?
            .json()
            .context("malformed chat completion response")?;
        first_content(response)
    }
}

fn first_embedding(response: EmbeddingResponse) -> Result<Vec<f32>> {
    response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| anyhow!("embeddings response contained no data"))
}

fn first_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("chat completion response contained no message content"))
}

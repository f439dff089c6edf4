//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_RETRIEVAL__TOP_N=5`). Provides a helper to expand `~` and `${VAR}` in
//! configured paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::debug!(env = other, "no profile file for environment"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extracts and validates the typed settings tree.
    pub fn settings(&self) -> Result<Settings, Error> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub chat: ChatSettings,
    pub api: ApiSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub cache: CacheSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let checks = [
            (self.embedding.dimension, "embedding.dimension"),
            (self.retrieval.top_k, "retrieval.top_k"),
            (self.retrieval.top_n, "retrieval.top_n"),
            (self.cache.capacity, "cache.capacity"),
        ];
        for (value, key) in checks {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{key} must be greater than zero")));
            }
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::InvalidConfig("cache.ttl_secs must be greater than zero".into()));
        }
        if self.index.page_index == self.index.question_bank_index {
            return Err(Error::InvalidConfig(
                "index.page_index and index.question_bank_index must differ".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSettings {
    pub corpus_path: String,
    pub question_bank_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            corpus_path: "equifax_10k_contents.json".into(),
            question_bank_path: "gpt_generated_question_bank.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingSettings {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model: "text-embedding-3-large".into(), dimension: 256 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub use_reminder: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { model: "gpt-3.5-turbo".into(), use_reminder: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Rebuilt in-process on every run; meant for tests and fake embeddings.
    Memory,
    #[default]
    Lancedb,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSettings {
    pub backend: IndexBackend,
    pub lancedb_path: String,
    pub page_index: String,
    pub question_bank_index: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            backend: IndexBackend::Lancedb,
            lancedb_path: "data/lancedb".into(),
            page_index: "prophet-equifax".into(),
            question_bank_index: "prophet-equifax-qb".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalSettings {
    /// Hits requested from each index.
    pub top_k: usize,
    /// Unique pages kept after fusion.
    pub top_n: usize,
    pub use_question_bank: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, top_n: 3, use_question_bank: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { capacity: 10_000, ttl_secs: 12 * 60 * 60 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

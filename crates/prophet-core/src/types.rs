//! Domain types shared by the embedding, index and answer crates.

use serde::{Deserialize, Serialize};

pub type PageId = String;

/// Which logical index produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Direct similarity against page text.
    Page,
    /// Similarity against a synthetic question about a page.
    QuestionBank,
}

/// A single nearest-neighbour result.
///
/// `id` is the raw id stored in the index: a page id for the page index,
/// `"{page_id}_{question_index}"` for the question-bank index. `score` is a
/// similarity, higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self { id: id.into(), score }
    }
}

/// A hit resolved to the page it supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageHit {
    pub page_id: PageId,
    pub score: f32,
    pub source: SourceKind,
}

impl PageHit {
    pub fn new(page_id: impl Into<PageId>, score: f32, source: SourceKind) -> Self {
        Self { page_id: page_id.into(), score, source }
    }
}

/// Similarity metric an index is created with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Dotproduct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

impl IndexSpec {
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self { name: name.into(), dimension, metric: Metric::Cosine }
    }
}

/// A vector keyed by its index id, ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Result of answering one query: the supporting pages (unique, in fused
/// order) and the model's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub pages: Vec<PageId>,
    pub answer: String,
}

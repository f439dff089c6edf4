//! Query pipeline: embed once, search both indices, fuse, then answer from
//! the selected pages.

use std::sync::Arc;

use prophet_core::config::Settings;
use prophet_core::error::{Error, Result};
use prophet_core::traits::VectorIndex;
use prophet_core::types::{PageHit, PageId, QueryResponse, SearchHit, SourceKind};
use prophet_llm::EmbeddingClient;
use prophet_vector::page_id_from_question_id;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::composer::AnswerComposer;
use crate::fusion::{fuse_hits, DEFAULT_TOP_N};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub page_index: String,
    pub question_bank_index: String,
    /// Hits requested from each index.
    pub top_k: usize,
    /// Unique pages passed to the composer.
    pub top_n: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            page_index: "prophet-equifax".into(),
            question_bank_index: "prophet-equifax-qb".into(),
            top_k: 3,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl EngineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            page_index: settings.index.page_index.clone(),
            question_bank_index: settings.index.question_bank_index.clone(),
            top_k: settings.retrieval.top_k,
            top_n: settings.retrieval.top_n,
        }
    }
}

pub struct QueryEngine {
    embedder: EmbeddingClient,
    index: Arc<dyn VectorIndex>,
    composer: AnswerComposer,
    options: EngineOptions,
}

impl QueryEngine {
    pub fn new(
        embedder: EmbeddingClient,
        index: Arc<dyn VectorIndex>,
        composer: AnswerComposer,
        options: EngineOptions,
    ) -> Self {
        Self { embedder, index, composer, options }
    }

    /// Ranked, de-duplicated supporting pages for `query`.
    ///
    /// The page index must answer; a failing or empty question-bank search,
    /// or a question-bank hit with a malformed id, only narrows the result.
    pub fn retrieve(&self, query: &str, use_question_bank: bool) -> Result<Vec<PageHit>> {
        validate_query(query)?;

        let vector = self.embedder.embed(query).map_err(|e| Error::service("embedding", e))?;

        let page_hits: Vec<PageHit> = self
            .index
            .query(&self.options.page_index, &vector, self.options.top_k)
            .map_err(|e| Error::service("page-index query", e))?
            .into_iter()
            .map(|h| PageHit::new(h.id, h.score, SourceKind::Page))
            .collect();

        let question_hits = if use_question_bank {
            self.question_bank_hits(&vector)
        } else {
            Vec::new()
        };

        let fused = fuse_hits(&page_hits, &question_hits, self.options.top_n);
        for hit in &fused {
            if !self.composer.corpus().contains(&hit.page_id) {
                return Err(Error::MissingPage(hit.page_id.clone()));
            }
        }
        debug!(
            page_hits = page_hits.len(),
            question_hits = question_hits.len(),
            selected = fused.len(),
            "fused retrieval results"
        );
        Ok(fused)
    }

    /// Question-bank hits resolved to pages. Any failure here narrows the
    /// result instead of failing the request.
    fn question_bank_hits(&self, vector: &[f32]) -> Vec<PageHit> {
        let index = &self.options.question_bank_index;
        let hits = match self.index.query(index, vector, self.options.top_k) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(index = %index, error = %format!("{e:#}"), "question-bank query failed; using page hits only");
                return Vec::new();
            }
        };
        if hits.is_empty() {
            warn!(index = %index, "question-bank query returned no hits; using page hits only");
        }
        hits.into_iter()
            .filter_map(|h| match question_hit_to_page(index, h) {
                Ok(hit) => Some(hit),
                Err(e) => {
                    warn!(error = %e, "dropping question-bank hit");
                    None
                }
            })
            .collect()
    }

    /// Answers `query` from the pages it retrieves.
    pub fn process_query(
        &self,
        system_prompt: &str,
        query: &str,
        model: &str,
        use_question_bank: bool,
    ) -> Result<QueryResponse> {
        let pages: Vec<PageId> = self
            .retrieve(query, use_question_bank)?
            .into_iter()
            .map(|h| h.page_id)
            .collect();
        info!(?pages, model, "answering query");
        let answer = self.composer.answer(system_prompt, query, &pages, model)?;
        Ok(QueryResponse { pages, answer })
    }
}

fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidQuery("query is empty".into()));
    }
    Ok(())
}

fn question_hit_to_page(index: &str, hit: SearchHit) -> Result<PageHit> {
    match page_id_from_question_id(&hit.id) {
        Some(page) => Ok(PageHit::new(page, hit.score, SourceKind::QuestionBank)),
        None => Err(Error::MalformedHitId { index: index.to_string(), id: hit.id }),
    }
}

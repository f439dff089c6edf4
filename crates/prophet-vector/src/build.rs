//! Builds the page index and the question-bank index from the static files.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use prophet_core::traits::VectorIndex;
use prophet_core::types::{IndexSpec, VectorRecord};
use prophet_core::{Corpus, QuestionBank};
use prophet_llm::EmbeddingClient;

use crate::ids::question_id;

const UPSERT_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub questions: usize,
    /// Questions dropped because their page is not in the corpus.
    pub skipped_questions: usize,
}

pub struct IndexBuilder<'a> {
    index: &'a dyn VectorIndex,
    embedder: &'a EmbeddingClient,
    page_index: String,
    question_bank_index: String,
    show_progress: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        index: &'a dyn VectorIndex,
        embedder: &'a EmbeddingClient,
        page_index: impl Into<String>,
        question_bank_index: impl Into<String>,
    ) -> Self {
        Self {
            index,
            embedder,
            page_index: page_index.into(),
            question_bank_index: question_bank_index.into(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn build(&self, corpus: &Corpus, bank: &QuestionBank) -> Result<BuildReport> {
        let dimension = self.embedder.dim();
        self.index.create_index(&IndexSpec::cosine(&self.page_index, dimension))?;
        self.index.create_index(&IndexSpec::cosine(&self.question_bank_index, dimension))?;

        let pages = self.index_pages(corpus)?;
        let (questions, skipped_questions) = self.index_questions(corpus, bank)?;
        let report = BuildReport { pages, questions, skipped_questions };
        tracing::info!(?report, "index build complete");
        Ok(report)
    }

    fn index_pages(&self, corpus: &Corpus) -> Result<usize> {
        tracing::info!(pages = corpus.len(), index = %self.page_index, "embedding pages");
        let pb = self.progress(corpus.len(), "pages")?;
        let mut batch = Vec::with_capacity(UPSERT_BATCH);
        let mut count = 0usize;
        for (id, text) in corpus.iter() {
            let values = self.embedder.embed(text).with_context(|| format!("embedding page {id}"))?;
            batch.push(VectorRecord { id: id.to_string(), values });
            count += 1;
            pb.inc(1);
            if batch.len() >= UPSERT_BATCH {
                self.index.upsert(&self.page_index, &batch)?;
                batch.clear();
            }
        }
        self.index.upsert(&self.page_index, &batch)?;
        pb.finish_and_clear();
        Ok(count)
    }

    fn index_questions(&self, corpus: &Corpus, bank: &QuestionBank) -> Result<(usize, usize)> {
        tracing::info!(questions = bank.question_count(), index = %self.question_bank_index, "embedding question bank");
        let pb = self.progress(bank.question_count(), "questions")?;
        let mut batch = Vec::with_capacity(UPSERT_BATCH);
        let (mut count, mut skipped) = (0usize, 0usize);
        for (page, questions) in bank.iter() {
            if !corpus.contains(page) {
                tracing::warn!(page, questions = questions.len(), "question bank references unknown page, skipping");
                skipped += questions.len();
                pb.inc(questions.len() as u64);
                continue;
            }
            for (i, question) in questions.iter().enumerate() {
                let values = self
                    .embedder
                    .embed(question)
                    .with_context(|| format!("embedding question {i} of page {page}"))?;
                batch.push(VectorRecord { id: question_id(page, i), values });
                count += 1;
                pb.inc(1);
                if batch.len() >= UPSERT_BATCH {
                    self.index.upsert(&self.question_bank_index, &batch)?;
                    batch.clear();
                }
            }
        }
        self.index.upsert(&self.question_bank_index, &batch)?;
        pb.finish_and_clear();
        Ok((count, skipped))
    }

    fn progress(&self, len: usize, unit: &str) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!("{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%)"))?
                .progress_chars("#>-"),
        );
        Ok(pb)
    }
}

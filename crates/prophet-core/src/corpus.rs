//! Static corpus and question-bank loading.
//!
//! Both files are JSON objects keyed by page id. They are read once at
//! startup and never mutated afterwards.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::PageId;

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| Error::Io { path: display.clone(), source })?;
    serde_json::from_str(&raw).map_err(|source| Error::Json { path: display, source })
}

/// Numeric ids sort numerically, everything else lexically after them.
fn page_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Read-only page id → page text map.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pages: HashMap<PageId, String>,
    order: Vec<PageId>,
}

impl Corpus {
    pub fn load(path: &Path) -> Result<Self> {
        let pages: HashMap<PageId, String> = read_json(path)?;
        let corpus = Self::from_pages(pages);
        tracing::info!(pages = corpus.len(), path = %path.display(), "loaded corpus");
        Ok(corpus)
    }

    pub fn from_pages<I, K, V>(pages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PageId>,
        V: Into<String>,
    {
        let pages: HashMap<PageId, String> =
            pages.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let mut order: Vec<PageId> = pages.keys().cloned().collect();
        order.sort_by(|a, b| page_order(a, b));
        Self { pages, order }
    }

    /// Text of a page; a missing id is a consistency fault.
    pub fn page(&self, id: &str) -> Result<&str> {
        self.pages
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| Error::MissingPage(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pages.contains_key(id)
    }

    /// Pages in natural id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(|id| self.pages.get(id).map(|text| (id.as_str(), text.as_str())))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuestions {
    One(String),
    Many(Vec<String>),
}

/// Pre-generated questions per page, consumed only when building the
/// question-bank index.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    entries: Vec<(PageId, Vec<String>)>,
}

impl QuestionBank {
    pub fn load(path: &Path) -> Result<Self> {
        let raw: HashMap<PageId, RawQuestions> = read_json(path)?;
        let bank = Self::from_entries(raw.into_iter().map(|(page, questions)| {
            let questions = match questions {
                RawQuestions::One(q) => vec![q],
                RawQuestions::Many(qs) => qs,
            };
            (page, questions)
        }));
        tracing::info!(pages = bank.entries.len(), questions = bank.question_count(), "loaded question bank");
        Ok(bank)
    }

    /// Builds a bank, splitting single-item entries that hold several
    /// questions in one string.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<PageId>,
    {
        let mut entries: Vec<(PageId, Vec<String>)> = entries
            .into_iter()
            .map(|(page, questions)| {
                let questions = if questions.len() == 1 { split_questions(&questions) } else { questions };
                (page.into(), questions)
            })
            .collect();
        entries.sort_by(|(a, _), (b, _)| page_order(a, b));
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(page, qs)| (page.as_str(), qs.as_slice()))
    }

    pub fn questions(&self, page: &str) -> Option<&[String]> {
        self.entries.iter().find(|(p, _)| p == page).map(|(_, qs)| qs.as_slice())
    }

    pub fn question_count(&self) -> usize {
        self.entries.iter().map(|(_, qs)| qs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn numbered_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.").expect("static regex"))
}

fn numbered_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\s+").expect("static regex"))
}

fn line_split() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\n\s*").expect("static regex"))
}

/// Splits generated question blobs into individual questions.
///
/// Items starting with a numbered marker (`1.`) are split on the markers;
/// other items are split on line breaks with surrounding quotes removed.
pub fn split_questions(items: &[String]) -> Vec<String> {
    let mut questions = Vec::new();
    for item in items {
        let item = item.trim();
        if numbered_marker().is_match(item) {
            questions.extend(numbered_split().split(item).map(str::to_string));
        } else {
            questions.extend(
                line_split()
                    .split(item)
                    .map(|q| q.trim().trim_matches('"').trim().to_string()),
            );
        }
    }
    questions.retain(|q| !q.trim().is_empty());
    questions.iter_mut().for_each(|q| *q = q.trim().to_string());
    questions
}

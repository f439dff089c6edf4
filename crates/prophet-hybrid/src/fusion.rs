//! Rank fusion of page-index and question-bank hits.
//!
//! Both lists are concatenated (page hits first), stably sorted by
//! descending score and walked in order, keeping the first occurrence of each
//! page until `top_n` pages are selected. Equal scores therefore favour page
//! hits over question-bank hits and, within a source, the input rank.

use std::cmp::Ordering;
use std::collections::HashSet;

use prophet_core::types::{PageHit, PageId};

pub const DEFAULT_TOP_N: usize = 3;

/// Fused hits, one per page, carrying the score and source that selected it.
pub fn fuse_hits(page_hits: &[PageHit], question_hits: &[PageHit], top_n: usize) -> Vec<PageHit> {
    let mut combined: Vec<&PageHit> = page_hits
        .iter()
        .chain(question_hits)
        .filter(|h| !h.score.is_nan())
        .collect();
    // sort_by is stable: ties keep concatenation order
    combined.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut selected = Vec::with_capacity(top_n.min(combined.len()));
    for hit in combined {
        if selected.len() >= top_n {
            break;
        }
        if seen.insert(hit.page_id.as_str()) {
            selected.push(hit.clone());
        }
    }
    selected
}

/// Page ids of [`fuse_hits`], in selection order.
pub fn fuse(page_hits: &[PageHit], question_hits: &[PageHit], top_n: usize) -> Vec<PageId> {
    fuse_hits(page_hits, question_hits, top_n)
        .into_iter()
        .map(|h| h.page_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prophet_core::types::SourceKind;

    fn page(id: &str, score: f32) -> PageHit {
        PageHit::new(id, score, SourceKind::Page)
    }

    fn qb(id: &str, score: f32) -> PageHit {
        PageHit::new(id, score, SourceKind::QuestionBank)
    }

    #[test]
    fn equal_scores_prefer_page_source_then_rank() {
        let fused = fuse(&[page("A", 0.9), page("B", 0.9)], &[qb("C", 0.9)], 2);
        assert_eq!(fused, vec!["A", "B"]);
    }

    #[test]
    fn duplicate_pages_are_counted_once() {
        let fused = fuse(&[page("P1", 0.8), page("P2", 0.5)], &[qb("P1", 0.95)], 2);
        assert_eq!(fused, vec!["P1", "P2"]);
    }

    #[test]
    fn best_score_decides_the_winning_source() {
        let hits = fuse_hits(&[page("P1", 0.8), page("P2", 0.5)], &[qb("P1", 0.95)], 2);
        assert_eq!(hits[0].source, SourceKind::QuestionBank);
        assert!((hits[0].score - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn fewer_unique_pages_than_top_n_is_not_padded() {
        let fused = fuse(&[page("P1", 0.4)], &[qb("P1", 0.7), qb("P1", 0.6)], 3);
        assert_eq!(fused, vec!["P1"]);
    }

    #[test]
    fn question_bank_hit_can_outrank_every_page_hit() {
        let fused = fuse(&[page("1", 0.3), page("2", 0.2)], &[qb("9", 0.8)], 3);
        assert_eq!(fused, vec!["9", "1", "2"]);
    }

    #[test]
    fn stops_at_top_n() {
        let fused = fuse(
            &[page("1", 0.9), page("2", 0.8), page("3", 0.7)],
            &[qb("4", 0.85), qb("5", 0.75)],
            3,
        );
        assert_eq!(fused, vec!["1", "4", "2"]);
    }

    #[test]
    fn empty_inputs_and_zero_top_n() {
        assert!(fuse(&[], &[], 3).is_empty());
        assert!(fuse(&[page("1", 0.9)], &[], 0).is_empty());
    }

    #[test]
    fn nan_scores_are_ignored() {
        let fused = fuse(&[page("1", f32::NAN), page("2", 0.1)], &[qb("3", 0.2)], 3);
        assert_eq!(fused, vec!["3", "2"]);
    }
}

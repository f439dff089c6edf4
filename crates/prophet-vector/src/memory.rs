use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, ensure, Result};
use prophet_core::traits::VectorIndex;
use prophet_core::types::{IndexSpec, Metric, SearchHit, VectorRecord};

struct Collection {
    dimension: usize,
    metric: Metric,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    positions: HashMap<String, usize>,
}

impl Collection {
    fn new(spec: &IndexSpec) -> Self {
        Self {
            dimension: spec.dimension,
            metric: spec.metric,
            ids: Vec::new(),
            vectors: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn upsert(&mut self, record: &VectorRecord) {
        match self.positions.get(&record.id) {
            Some(&pos) => self.vectors[pos] = record.values.clone(),
            None => {
                self.positions.insert(record.id.clone(), self.ids.len());
                self.ids.push(record.id.clone());
                self.vectors.push(record.values.clone());
            }
        }
    }
}

/// Exact brute-force index; ties keep insertion order.
#[derive(Default)]
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, index: &str) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .map_or(0, |c| c.ids.len())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom <= f32::EPSILON { 0.0 } else { dot / denom }
}

fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Metric::Cosine => cosine_similarity(a, b),
        Metric::Dotproduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Metric::Euclidean => {
            let d2: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
            1.0 / (1.0 + d2)
        }
    }
}

impl VectorIndex for MemoryIndex {
    fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        ensure!(spec.dimension > 0, "index '{}' needs a positive dimension", spec.name);
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = collections.get(&spec.name) {
            ensure!(
                existing.dimension == spec.dimension,
                "index '{}' already exists with dimension {}",
                spec.name,
                existing.dimension
            );
            return Ok(());
        }
        collections.insert(spec.name.clone(), Collection::new(spec));
        tracing::debug!(index = %spec.name, dimension = spec.dimension, "created in-memory index");
        Ok(())
    }

    fn upsert(&self, index: &str, records: &[VectorRecord]) -> Result<()> {
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let collection = collections
            .get_mut(index)
            .ok_or_else(|| anyhow!("index '{index}' does not exist"))?;
        for record in records {
            ensure!(
                record.values.len() == collection.dimension,
                "vector for '{}' has dimension {}, index '{}' expects {}",
                record.id,
                record.values.len(),
                index,
                collection.dimension
            );
        }
        for record in records {
            collection.upsert(record);
        }
        Ok(())
    }

    fn query(&self, index: &str, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        let collection = collections
            .get(index)
            .ok_or_else(|| anyhow!("index '{index}' does not exist"))?;
        ensure!(
            vector.len() == collection.dimension,
            "query vector has dimension {}, index '{}' expects {}",
            vector.len(),
            index,
            collection.dimension
        );
        let mut hits: Vec<SearchHit> = collection
            .ids
            .iter()
            .zip(&collection.vectors)
            .map(|(id, v)| SearchHit::new(id.clone(), score(collection.metric, vector, v)))
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, values: &[f32]) -> VectorRecord {
        VectorRecord { id: id.to_string(), values: values.to_vec() }
    }

    fn index_with(records: &[VectorRecord]) -> MemoryIndex {
        let idx = MemoryIndex::new();
        idx.create_index(&IndexSpec::cosine("pages", 2)).unwrap();
        idx.upsert("pages", records).unwrap();
        idx
    }

    #[test]
    fn returns_top_k_by_cosine() {
        let idx = index_with(&[record("a", &[1.0, 0.0]), record("b", &[0.0, 1.0]), record("c", &[1.0, 1.0])]);
        let hits = idx.query("pages", &[1.0, 0.1], 2).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn upsert_replaces_existing_vector() {
        let idx = index_with(&[record("a", &[1.0, 0.0]), record("b", &[0.0, 1.0])]);
        idx.upsert("pages", &[record("a", &[0.0, -1.0])]).unwrap();
        assert_eq!(idx.count("pages"), 2);
        let hits = idx.query("pages", &[0.0, 1.0], 2).unwrap();
        assert_eq!(hits[0].id, "b");
        assert!((hits[1].score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let idx = index_with(&[record("x", &[1.0, 0.0]), record("y", &[2.0, 0.0])]);
        let hits = idx.query("pages", &[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].id, "x");
        assert_eq!(hits[1].id, "y");
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let idx = index_with(&[]);
        assert!(idx.upsert("pages", &[record("a", &[1.0, 0.0, 0.0])]).is_err());
        assert!(idx.query("pages", &[1.0], 1).is_err());
    }

    #[test]
    fn unknown_index_is_an_error() {
        let idx = MemoryIndex::new();
        assert!(idx.query("missing", &[1.0], 1).is_err());
    }

    #[test]
    fn create_index_is_idempotent() {
        let idx = index_with(&[record("a", &[1.0, 0.0])]);
        idx.create_index(&IndexSpec::cosine("pages", 2)).unwrap();
        assert_eq!(idx.count("pages"), 1);
        assert!(idx.create_index(&IndexSpec::cosine("pages", 3)).is_err());
    }
}

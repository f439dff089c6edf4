//! LanceDB-backed vector index.
//!
//! Each logical index is a table `(id, vector)`. LanceDB is async; this type
//! owns a current-thread runtime and blocks on it so callers stay
//! synchronous. Do not call it from inside another tokio runtime.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{anyhow, ensure, Context, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType};
use tokio::runtime::Runtime;

use prophet_core::traits::VectorIndex;
use prophet_core::types::{IndexSpec, Metric, SearchHit, VectorRecord};

use crate::schema::{build_index_schema, vector_dimension};

pub struct LanceIndex {
    runtime: Runtime,
    db: Connection,
    // Lance tables do not record the metric; indices created elsewhere default to cosine.
    metrics: RwLock<HashMap<String, Metric>>,
}

fn distance_type(metric: Metric) -> DistanceType {
    match metric {
        Metric::Cosine => DistanceType::Cosine,
        Metric::Euclidean => DistanceType::L2,
        Metric::Dotproduct => DistanceType::Dot,
    }
}

/// Converts a Lance distance into a higher-is-better similarity.
fn similarity(metric: Metric, distance: f32) -> f32 {
    match metric {
        Metric::Cosine | Metric::Dotproduct => 1.0 - distance,
        Metric::Euclidean => 1.0 / (1.0 + distance),
    }
}

impl LanceIndex {
    pub fn open(uri: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start LanceDB runtime")?;
        let db = runtime
            .block_on(async { connect(uri).execute().await })
            .with_context(|| format!("failed to open LanceDB at {uri}"))?;
        tracing::info!(uri, "opened LanceDB");
        Ok(Self { runtime, db, metrics: RwLock::new(HashMap::new()) })
    }

    fn metric(&self, index: &str) -> Metric {
        self.metrics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .copied()
            .unwrap_or_default()
    }

    async fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.db.table_names().execute().await?.iter().any(|n| n == name))
    }

    async fn create(&self, spec: &IndexSpec) -> Result<()> {
        let dimension = i32::try_from(spec.dimension).context("dimension too large")?;
        if self.table_exists(&spec.name).await? {
            let table = self.db.open_table(&spec.name).execute().await?;
            let existing = vector_dimension(&*table.schema().await?);
            ensure!(
                existing == Some(dimension),
                "index '{}' already exists with dimension {:?}",
                spec.name,
                existing
            );
            return Ok(());
        }
        let schema = build_index_schema(dimension);
        // create empty table with 0 rows
        let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
        self.db.create_table(&spec.name, Box::new(iter)).execute().await?;
        tracing::info!(index = %spec.name, dimension, "created LanceDB index table");
        Ok(())
    }

    async fn upsert_async(&self, index: &str, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        ensure!(self.table_exists(index).await?, "index '{index}' does not exist");
        let table = self.db.open_table(index).execute().await?;
        let schema = table.schema().await?;
        let dimension = vector_dimension(&schema).ok_or_else(|| anyhow!("index '{index}' has no vector column"))?;
        for record in records {
            ensure!(
                record.values.len() == dimension as usize,
                "vector for '{}' has dimension {}, index '{}' expects {}",
                record.id,
                record.values.len(),
                index,
                dimension
            );
        }

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let vectors: Vec<Option<Vec<Option<f32>>>> =
            records.iter().map(|r| Some(r.values.iter().map(|&x| Some(x)).collect())).collect();
        let rb = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dimension)),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), schema));
        // Upsert behavior via merge_insert: id is unique
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let _ = mi.execute(reader).await?;
        Ok(())
    }

    async fn query_async(&self, index: &str, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let metric = self.metric(index);
        let table = self
            .db
            .open_table(index)
            .execute()
            .await
            .with_context(|| format!("index '{index}' does not exist"))?;
        let mut stream = table
            .vector_search(vector.to_vec())?
            .distance_type(distance_type(metric))
            .limit(top_k)
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
            let id_col = batch
                .column_by_name("id")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| anyhow!("id column missing from search results"))?;
            let dist_col = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| anyhow!("_distance column missing from search results"))?;
            for i in 0..batch.num_rows() {
                if id_col.is_null(i) {
                    continue;
                }
                hits.push(SearchHit::new(id_col.value(i), similarity(metric, dist_col.value(i))));
            }
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

impl VectorIndex for LanceIndex {
    fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        ensure!(spec.dimension > 0, "index '{}' needs a positive dimension", spec.name);
        self.runtime.block_on(self.create(spec))?;
        self.metrics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spec.name.clone(), spec.metric);
        Ok(())
    }

    fn upsert(&self, index: &str, records: &[VectorRecord]) -> Result<()> {
        self.runtime.block_on(self.upsert_async(index, records))
    }

    fn query(&self, index: &str, vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        self.runtime.block_on(self.query_async(index, vector, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_distance_maps_to_similarity() {
        assert!((similarity(Metric::Cosine, 0.0) - 1.0).abs() < f32::EPSILON);
        assert!((similarity(Metric::Cosine, 2.0) + 1.0).abs() < f32::EPSILON);
        assert!(similarity(Metric::Euclidean, 0.5) > similarity(Metric::Euclidean, 2.0));
    }
}

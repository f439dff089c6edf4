//! Vector index backends and index building.
//!
//! `MemoryIndex` is an exact in-process cosine search used for small corpora
//! and tests; `LanceIndex` persists collections as LanceDB tables. Both sit
//! behind `prophet_core::traits::VectorIndex`.

use std::sync::Arc;

use anyhow::Result;
use prophet_core::config::{expand_path, IndexBackend, IndexSettings};
use prophet_core::traits::VectorIndex;

pub mod build;
pub mod ids;
pub mod lance;
pub mod memory;
pub mod schema;

pub use build::{BuildReport, IndexBuilder};
pub use ids::{page_id_from_question_id, question_id};
pub use lance::LanceIndex;
pub use memory::MemoryIndex;

/// Opens the backend selected in settings.
pub fn open_index(settings: &IndexSettings) -> Result<Arc<dyn VectorIndex>> {
    match settings.backend {
        IndexBackend::Memory => Ok(Arc::new(MemoryIndex::new())),
        IndexBackend::Lancedb => {
            let path = expand_path(&settings.lancedb_path);
            Ok(Arc::new(LanceIndex::open(&path.to_string_lossy())?))
        }
    }
}

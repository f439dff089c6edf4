pub mod cache;
pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;

pub use cache::{CacheKey, CachedValue, ResponseCache, TtlCache};
pub use corpus::{split_questions, Corpus, QuestionBank};
pub use error::{Error, Result};

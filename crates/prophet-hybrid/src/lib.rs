//! Question answering over the filing: two-index retrieval, rank fusion and
//! grounded answer composition.

pub mod composer;
pub mod engine;
pub mod fusion;
pub mod prompts;

pub use composer::AnswerComposer;
pub use engine::{EngineOptions, QueryEngine};
pub use fusion::{fuse, fuse_hits, DEFAULT_TOP_N};
pub use prompts::{NO_RELEVANT_INFORMATION, REMINDER_PROMPT, SYSTEM_PROMPT};

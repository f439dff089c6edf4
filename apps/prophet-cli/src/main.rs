use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prophet_core::cache::ResponseCache;
use prophet_core::config::{expand_path, Config, IndexBackend, Settings};
use prophet_core::traits::{ChatCompleter, VectorIndex};
use prophet_core::{Corpus, QuestionBank};
use prophet_hybrid::{AnswerComposer, EngineOptions, QueryEngine, SYSTEM_PROMPT};
use prophet_llm::{get_default_embedder, use_fake_embeddings, EmbeddingClient, OpenAiClient};
use prophet_vector::{open_index, IndexBuilder};

/// Ask questions about the Equifax 10-K filing
#[derive(Parser, Debug)]
#[command(name = "prophet")]
#[command(about = "Answer questions about the Equifax 10-K from its own pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed the corpus and question bank into the configured indices
    Index,

    /// Answer a question
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Chat model (defaults to chat.model)
        #[arg(short, long)]
        model: Option<String>,

        /// Rank with the page index only
        #[arg(long)]
        no_question_bank: bool,

        /// Print the supporting page excerpts after the answer
        #[arg(long)]
        show_context: bool,

        /// Replace the built-in system prompt with the contents of a file
        #[arg(long, value_name = "PATH")]
        system_prompt_file: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

struct Services {
    settings: Settings,
    corpus: Arc<Corpus>,
    cache: Arc<ResponseCache>,
    embedder: EmbeddingClient,
    index: Arc<dyn VectorIndex>,
}

impl Services {
    fn load() -> Result<Self> {
        let settings = Config::load()?.settings()?;
        let corpus = Corpus::load(&expand_path(&settings.data.corpus_path))?;

        let cache = Arc::new(ResponseCache::new(
            settings.cache.capacity,
            Duration::from_secs(settings.cache.ttl_secs),
        ));
        let embedder = EmbeddingClient::new(
            get_default_embedder(&settings)?,
            cache.clone(),
            settings.embedding.model.clone(),
        );
        let index = open_index(&settings.index).context("opening vector index")?;
        Ok(Self { settings, corpus: Arc::new(corpus), cache, embedder, index })
    }

    fn build_indices(&self, show_progress: bool) -> Result<()> {
        let bank_path = expand_path(&self.settings.data.question_bank_path);
        let bank = QuestionBank::load(&bank_path)?;
        let report = IndexBuilder::new(
            self.index.as_ref(),
            &self.embedder,
            &self.settings.index.page_index,
            &self.settings.index.question_bank_index,
        )
        .with_progress(show_progress)
        .build(&self.corpus, &bank)?;
        tracing::info!(
            pages = report.pages,
            questions = report.questions,
            skipped = report.skipped_questions,
            "indices ready"
        );
        Ok(())
    }
}

/// The memory backend re-embeds the whole corpus on every `ask`; only the
/// local fake embedder makes that affordable.
fn check_ask_backend(backend: IndexBackend, fake_embeddings: bool) -> Result<()> {
    if backend == IndexBackend::Memory && !fake_embeddings {
        bail!(
            "index.backend = \"memory\" rebuilds every index through the embedding API on each ask; \
             use the lancedb backend and run `prophet index` once, or set APP_USE_FAKE_EMBEDDINGS=1"
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let services = Services::load()?;

    match cli.command {
        Command::Index => {
            if services.settings.index.backend == IndexBackend::Memory {
                tracing::warn!("memory backend selected; indices are discarded on exit");
            }
            services.build_indices(true)?;
        }
        Command::Ask { question, model, no_question_bank, show_context, system_prompt_file } => {
            check_ask_backend(services.settings.index.backend, use_fake_embeddings())?;
            if services.settings.index.backend == IndexBackend::Memory {
                tracing::warn!("memory backend selected; building indices in-process");
                services.build_indices(false)?;
            }

            let system_prompt = match system_prompt_file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading system prompt {}", path.display()))?,
                None => SYSTEM_PROMPT.to_string(),
            };
            let model = model.unwrap_or_else(|| services.settings.chat.model.clone());
            let use_question_bank = services.settings.retrieval.use_question_bank && !no_question_bank;

            let chat: Arc<dyn ChatCompleter> = Arc::new(OpenAiClient::from_settings(
                &services.settings.api,
                services.settings.embedding.dimension,
            )?);
            let composer = AnswerComposer::new(chat, services.cache.clone(), services.corpus.clone())
                .with_reminder(services.settings.chat.use_reminder);
            let options = EngineOptions::from_settings(&services.settings);
            let engine = QueryEngine::new(services.embedder.clone(), services.index.clone(), composer, options);

            let response = engine.process_query(&system_prompt, &question, &model, use_question_bank)?;
            println!("{}", response.answer);
            println!("\nPages: {}", response.pages.join(", "));
            if show_context {
                for page in &response.pages {
                    println!("\n--- page {page} ---\n{}", services.corpus.page(page)?);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_needs_fake_embeddings_to_ask() {
        assert!(check_ask_backend(IndexBackend::Memory, false).is_err());
        assert!(check_ask_backend(IndexBackend::Memory, true).is_ok());
        assert!(check_ask_backend(IndexBackend::Lancedb, false).is_ok());
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use prophet_core::cache::{CacheKey, CachedValue, ResponseCache};
use prophet_core::error::{Error, Result};
use prophet_core::traits::ChatCompleter;
use prophet_core::types::{ChatMessage, PageId};
use prophet_core::Corpus;

use crate::prompts::REMINDER_PROMPT;

/// Builds the grounded prompt and asks the chat model, caching answers by
/// the exact (system prompt, user message, model, reminder) tuple.
pub struct AnswerComposer {
    chat: Arc<dyn ChatCompleter>,
    cache: Arc<ResponseCache>,
    corpus: Arc<Corpus>,
    use_reminder: bool,
}

impl AnswerComposer {
    pub fn new(chat: Arc<dyn ChatCompleter>, cache: Arc<ResponseCache>, corpus: Arc<Corpus>) -> Self {
        Self { chat, cache, corpus, use_reminder: true }
    }

    pub fn with_reminder(mut self, use_reminder: bool) -> Self {
        self.use_reminder = use_reminder;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Query followed by the text of each supporting page. Repeated ids are
    /// included once; an id missing from the corpus is an error.
    pub fn user_message(&self, query: &str, pages: &[PageId]) -> Result<String> {
        let mut message = format!("{query}\n here are the relevant text chunks:\n");
        let mut seen = HashSet::new();
        for id in pages.iter().filter(|id| seen.insert(id.as_str())) {
            let text = self.corpus.page(id)?;
            message.push_str(&format!("\n[page {id}]\n{text}\n"));
        }
        Ok(message)
    }

    pub fn answer(&self, system_prompt: &str, query: &str, pages: &[PageId], model: &str) -> Result<String> {
        let user_message = self.user_message(query, pages)?;
        self.complete(system_prompt, &user_message, model)
            .map_err(|e| Error::service("chat completion", e))
    }

    fn complete(&self, system_prompt: &str, user_message: &str, model: &str) -> anyhow::Result<String> {
        let key = CacheKey::Answer {
            system_prompt: system_prompt.to_string(),
            user_message: user_message.to_string(),
            model: model.to_string(),
            use_reminder: self.use_reminder,
        };
        if let Some(CachedValue::Text(answer)) = self.cache.get(&key) {
            tracing::debug!(model, "answer cache hit");
            return Ok(answer);
        }

        let mut messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(user_message)];
        if self.use_reminder {
            messages.push(ChatMessage::user(REMINDER_PROMPT));
        }
        let answer = self.chat.complete(&messages, model)?;
        self.cache.put(key, CachedValue::Text(answer.clone()));
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ChatCompleter for Scripted {
        fn complete(&self, messages: &[ChatMessage], _model: &str) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            Ok("answer".into())
        }
    }

    fn composer(chat: Arc<Scripted>) -> AnswerComposer {
        let corpus = Corpus::from_pages([("1", "first page"), ("2", "second page")]);
        AnswerComposer::new(chat, Arc::new(ResponseCache::default()), Arc::new(corpus))
    }

    #[test]
    fn user_message_contains_query_and_page_text() {
        let c = composer(Arc::new(Scripted::default()));
        let msg = c.user_message("why?", &["2".into(), "1".into(), "2".into()]).unwrap();
        assert!(msg.starts_with("why?\n"));
        assert_eq!(msg.matches("second page").count(), 1);
        assert!(msg.find("second page") < msg.find("first page"));
    }

    #[test]
    fn missing_page_fails_before_calling_the_model() {
        let chat = Arc::new(Scripted::default());
        let c = composer(chat.clone());
        let err = c.answer("sys", "q", &["404".into()], "m").unwrap_err();
        assert!(matches!(err, Error::MissingPage(id) if id == "404"));
        assert!(chat.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn reminder_is_sent_as_trailing_user_message() {
        let chat = Arc::new(Scripted::default());
        composer(chat.clone()).answer("sys", "q", &["1".into()], "m").unwrap();
        let requests = chat.requests.lock().unwrap();
        let sent = &requests[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], ChatMessage::system("sys"));
        assert_eq!(sent[2], ChatMessage::user(REMINDER_PROMPT));
    }

    #[test]
    fn reminder_flag_is_part_of_the_cache_key() {
        let chat = Arc::new(Scripted::default());
        let cache = Arc::new(ResponseCache::default());
        let corpus = Arc::new(Corpus::from_pages([("1", "text")]));
        let with = AnswerComposer::new(chat.clone(), cache.clone(), corpus.clone());
        let without = AnswerComposer::new(chat.clone(), cache, corpus).with_reminder(false);

        with.answer("sys", "q", &["1".into()], "m").unwrap();
        with.answer("sys", "q", &["1".into()], "m").unwrap();
        without.answer("sys", "q", &["1".into()], "m").unwrap();

        let requests = chat.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].len(), 2);
    }
}

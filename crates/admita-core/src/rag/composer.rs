//! Grounded prompt building and answer generation
//!
//! The composer never invents an answer: an empty retrieval yields the
//! configured "insufficient information" reply without touching the backend,
//! and a backend failure after retry is surfaced, not papered over.

use crate::config::Config;
use crate::error::{AdmitaError, Result};
use crate::llm::{ChatMessage, ChatModel, RetryPolicy};
use crate::search::RetrievalResult;
use std::sync::Arc;

const SYSTEM_INSTRUCTION: &str = "You are an assistant for prospective master's \
applicants choosing between the AI and AI Product program tracks. Answer using \
ONLY the information in the supplied passages. Cite the source identifier of \
any passage you rely on. If the passages do not contain the answer, say so \
plainly instead of guessing.";

/// Builds grounded prompts and obtains completions
pub struct AnswerComposer {
    chat: Arc<dyn ChatModel>,
    retry: RetryPolicy,
    no_answer_reply: String,
    history_window: usize,
}

impl AnswerComposer {
    pub fn new(chat: Arc<dyn ChatModel>, config: &Config) -> Self {
        Self {
            chat,
            retry: RetryPolicy::new(config.llm_service.max_attempts),
            no_answer_reply: config.replies.no_answer.clone(),
            history_window: config.intake.history_limit,
        }
    }

    /// Compose a grounded answer from retrieved passages and recent history
    pub async fn answer(
        &self,
        question: &str,
        retrieval: &RetrievalResult,
        history: &[ChatMessage],
    ) -> Result<String> {
        if retrieval.is_empty() {
            tracing::debug!("no passages retrieved, returning insufficient-information reply");
            return Ok(self.no_answer_reply.clone());
        }

        let messages = self.build_messages(question, retrieval, history);

        self.retry
            .run(|| self.chat.complete(messages.clone()))
            .await
            .map_err(|e| AdmitaError::Generation(e.to_string()))
    }

    fn build_messages(
        &self,
        question: &str,
        retrieval: &RetrievalResult,
        history: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(SYSTEM_INSTRUCTION)];

        let skip = history.len().saturating_sub(self.history_window);
        messages.extend(history[skip..].iter().cloned());

        let mut context = String::new();
        for scored in &retrieval.passages {
            context.push_str(&format!(
                "[source: {} | track: {}]\n{}\n\n",
                scored.chunk.source,
                scored.chunk.track.display_name(),
                scored.chunk.text
            ));
        }

        messages.push(ChatMessage::user(format!(
            "PASSAGES:\n{context}QUESTION:\n{question}"
        )));

        messages
    }
}

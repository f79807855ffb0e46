//! Per-conversation state
//!
//! State lives in an injectable store keyed by conversation identifier,
//! never in process-wide globals. Each conversation is guarded by its own
//! lock so message handling within a conversation is strictly sequential
//! while unrelated conversations proceed in parallel.

use crate::llm::ChatMessage;
use crate::recommend::Recommendation;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Dialogue stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    /// Collecting the attribute at this index of the configured sequence
    Collecting(usize),
    Complete,
    Abandoned,
}

/// Mutable state of one conversation
#[derive(Debug)]
pub struct ConversationState {
    pub stage: Stage,
    /// Collected attribute name -> validated value
    pub attributes: HashMap<String, String>,
    /// Rejected answers for the attribute currently being collected
    pub rejected_answers: usize,
    /// Recommendation computed when intake completed
    pub recommendation: Option<Recommendation>,
    history: VecDeque<ChatMessage>,
    history_limit: usize,
}

impl ConversationState {
    pub fn new(history_limit: usize) -> Self {
        Self {
            stage: Stage::Start,
            attributes: HashMap::new(),
            rejected_answers: 0,
            recommendation: None,
            history: VecDeque::new(),
            history_limit,
        }
    }

    /// Append a turn, evicting the oldest once the bound is reached
    pub fn push_turn(&mut self, message: ChatMessage) {
        while self.history.len() >= self.history_limit.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(message);
    }

    /// Recent turns, oldest first
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.iter().cloned().collect()
    }

    /// Discard everything and return to the initial stage
    pub fn reset(&mut self) {
        self.stage = Stage::Start;
        self.attributes.clear();
        self.rejected_answers = 0;
        self.recommendation = None;
        self.history.clear();
    }
}

/// Injectable store of conversation states keyed by conversation identifier
pub struct ConversationStore {
    history_limit: usize,
    inner: RwLock<HashMap<String, Arc<Mutex<ConversationState>>>>,
}

impl ConversationStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Get the state for a conversation, creating it on first contact
    pub async fn get_or_create(&self, conversation_id: &str) -> Arc<Mutex<ConversationState>> {
        {
            let map = self.inner.read().await;
            if let Some(state) = map.get(conversation_id) {
                return state.clone();
            }
        }
        let mut map = self.inner.write().await;
        map.entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::new(self.history_limit))))
            .clone()
    }

    /// Drop a conversation entirely (session ended)
    pub async fn remove(&self, conversation_id: &str) {
        self.inner.write().await.remove(conversation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_evicts_oldest_first() {
        let mut state = ConversationState::new(3);
        for i in 0..5 {
            state.push_turn(ChatMessage::user(format!("turn {i}")));
        }
        let history = state.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "turn 2");
        assert_eq!(history[2].content, "turn 4");
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut state = ConversationState::new(4);
        state.stage = Stage::Collecting(2);
        state.attributes.insert("education".into(), "cs".into());
        state.push_turn(ChatMessage::user("hello"));

        state.reset();
        assert_eq!(state.stage, Stage::Start);
        assert!(state.attributes.is_empty());
        assert!(state.history().is_empty());
    }

    #[tokio::test]
    async fn test_store_returns_same_state_per_id() {
        let store = ConversationStore::new(4);
        let a = store.get_or_create("chat-1").await;
        let b = store.get_or_create("chat-1").await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = store.get_or_create("chat-2").await;
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn test_remove_forgets_conversation() {
        let store = ConversationStore::new(4);
        let a = store.get_or_create("chat-1").await;
        a.lock().await.stage = Stage::Complete;
        store.remove("chat-1").await;

        let fresh = store.get_or_create("chat-1").await;
        assert_eq!(fresh.lock().await.stage, Stage::Start);
    }
}

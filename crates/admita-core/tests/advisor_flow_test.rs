//! End-to-end advisor flows: intake dialogue through recommendation, and
//! grounded Q&A with the backend stubbed out.

use admita_core::{
    shared, AdvisorService, ChatMessage, ChatModel, Config, Database, Document, DocumentKind,
    Embedder, Indexer, SharedDatabase, Track,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const VOCAB: &[&str] = &[
    "machine",
    "learning",
    "curriculum",
    "deep",
    "neural",
    "product",
    "management",
    "analytics",
    "market",
    "elective",
    "admission",
];

/// One dimension per vocabulary word; out-of-vocabulary text embeds to zero
struct BagEmbedder;

fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; VOCAB.len()];
    for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
        if let Some(i) = VOCAB.iter().position(|w| *w == word) {
            v[i] += 1.0;
        }
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

#[async_trait]
impl Embedder for BagEmbedder {
    async fn embed(&self, text: &str) -> admita_core::Result<Vec<f32>> {
        Ok(embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> admita_core::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

struct StubChat {
    calls: AtomicUsize,
    seen: std::sync::Mutex<Vec<ChatMessage>>,
    always_fail: bool,
}

impl StubChat {
    fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: std::sync::Mutex::new(Vec::new()),
            always_fail: false,
        }
    }

    fn broken() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: std::sync::Mutex::new(Vec::new()),
            always_fail: true,
        }
    }
}

#[async_trait]
impl ChatModel for StubChat {
    async fn complete(&self, messages: Vec<ChatMessage>) -> admita_core::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(admita_core::AdmitaError::ExternalError("backend down".into()));
        }
        let passages = messages
            .last()
            .map(|m| m.content.matches("[source:").count())
            .unwrap_or(0);
        *self.seen.lock().unwrap() = messages;
        Ok(format!("Based on {passages} passages."))
    }

    fn model_name(&self) -> &str {
        "stub-chat"
    }
}

fn open_db(dir: &TempDir) -> SharedDatabase {
    let db = Database::open(&dir.path().join("index.sqlite")).unwrap();
    db.initialize().unwrap();
    shared(db)
}

async fn seed_corpus(db: SharedDatabase, embedder: Arc<dyn Embedder>) {
    let indexer = Indexer::new(db, embedder, &Config::default()).unwrap();
    indexer
        .index(&Document::new(
            "https://example.edu/ai-curriculum",
            "The machine learning curriculum covers deep neural networks.",
            DocumentKind::Webpage,
            Track::Ai,
        ))
        .await
        .unwrap();
    indexer
        .index(&Document::new(
            "https://example.edu/product-electives",
            "Elective disciplines: product analytics, management of AI products, \
             market research.",
            DocumentKind::Webpage,
            Track::AiProduct,
        ))
        .await
        .unwrap();
}

async fn service(dir: &TempDir, chat: Arc<StubChat>) -> AdvisorService {
    let db = open_db(dir);
    let embedder: Arc<dyn Embedder> = Arc::new(BagEmbedder);
    seed_corpus(db.clone(), embedder.clone()).await;
    AdvisorService::new(db, embedder, chat, Config::default()).unwrap()
}

#[tokio::test]
async fn test_intake_dialogue_ends_with_grounded_recommendation() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, Arc::new(StubChat::ok())).await;
    let id = "conv-1";

    let reply = svc.handle_intake_message(id, "/intake").await.unwrap();
    assert!(reply.contains("educational background"));

    let reply = svc.handle_intake_message(id, "economics").await.unwrap();
    assert!(reply.contains("programming experience"));

    let reply = svc.handle_intake_message(id, "beginner").await.unwrap();
    assert!(reply.contains("interests you"));

    let reply = svc
        .handle_intake_message(id, "product management")
        .await
        .unwrap();
    assert!(reply.contains("role are you aiming"));

    let reply = svc.handle_intake_message(id, "product manager").await.unwrap();
    assert!(reply.contains("Recommended track: AI Product"));
    assert!(reply.contains("source: https://example.edu/product-electives"));

    // Further messages reuse the stored recommendation instead of recomputing
    let again = svc.handle_intake_message(id, "thanks!").await.unwrap();
    assert_eq!(again, reply);
}

#[tokio::test]
async fn test_rejected_intake_answer_reprompts_without_advancing() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, Arc::new(StubChat::ok())).await;
    let id = "conv-2";

    svc.handle_intake_message(id, "/intake").await.unwrap();

    let reply = svc.handle_intake_message(id, "1234567").await.unwrap();
    assert!(reply.contains("field of study"));

    // A valid answer still lands on the same attribute
    let reply = svc.handle_intake_message(id, "economics").await.unwrap();
    assert!(reply.contains("programming experience"));
}

#[tokio::test]
async fn test_cancel_and_reset_restart_the_dialogue() {
    let dir = TempDir::new().unwrap();
    let svc = service(&dir, Arc::new(StubChat::ok())).await;
    let id = "conv-3";

    svc.handle_intake_message(id, "/intake").await.unwrap();
    svc.handle_intake_message(id, "economics").await.unwrap();

    let reply = svc.handle_intake_message(id, "/cancel").await.unwrap();
    assert!(reply.contains("cancelled"));

    // Abandoned conversations stay abandoned until a reset
    let reply = svc.handle_intake_message(id, "beginner").await.unwrap();
    assert!(reply.contains("cancelled"));

    svc.reset(id).await;
    let reply = svc.handle_intake_message(id, "/intake").await.unwrap();
    assert!(reply.contains("educational background"));
}

#[tokio::test]
async fn test_question_is_answered_from_retrieved_passages() {
    let dir = TempDir::new().unwrap();
    let chat = Arc::new(StubChat::ok());
    let svc = service(&dir, chat.clone()).await;

    let reply = svc
        .handle_question("conv-4", "what does the machine learning curriculum cover?")
        .await
        .unwrap();

    assert!(reply.starts_with("Based on"));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_question_appears_exactly_once_in_prompt() {
    let dir = TempDir::new().unwrap();
    let chat = Arc::new(StubChat::ok());
    let svc = service(&dir, chat.clone()).await;

    let question = "what does the machine learning curriculum cover?";
    svc.handle_question("conv-7", question).await.unwrap();

    // The history window must not repeat the question the composer appends
    let seen = chat.seen.lock().unwrap();
    let occurrences: usize = seen.iter().map(|m| m.content.matches(question).count()).sum();
    assert_eq!(occurrences, 1);
}

#[tokio::test]
async fn test_unrelated_question_gets_no_answer_reply_without_backend_call() {
    let dir = TempDir::new().unwrap();
    let chat = Arc::new(StubChat::ok());
    let svc = service(&dir, chat.clone()).await;

    let reply = svc
        .handle_question("conv-5", "weather sports cooking")
        .await
        .unwrap();

    assert_eq!(reply, Config::default().replies.no_answer);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_backend_failure_yields_unavailable_reply() {
    let dir = TempDir::new().unwrap();
    let chat = Arc::new(StubChat::broken());
    let svc = service(&dir, chat.clone()).await;

    let reply = svc
        .handle_question("conv-6", "what does the machine learning curriculum cover?")
        .await
        .unwrap();

    assert_eq!(reply, Config::default().replies.unavailable);
    // One try plus one retry
    assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_track_summary_and_comparison_are_grounded() {
    let dir = TempDir::new().unwrap();
    let chat = Arc::new(StubChat::ok());
    let svc = service(&dir, chat.clone()).await;

    let summary = svc.track_summary(Track::Ai).await.unwrap();
    assert!(summary.starts_with("Based on"));

    let comparison = svc.compare_tracks().await.unwrap();
    assert!(comparison.starts_with("Based on"));
}

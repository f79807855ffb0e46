//! Admita Core Library
//!
//! Grounded Q&A and track recommendation for master's program applicants.
//!
//! # Features
//! - Overlapping character chunking of scraped program documents
//! - SQLite vector store with content-hash idempotent indexing
//! - Cosine-similarity retrieval with track filtering
//! - Grounded answer composition over any OpenAI-compatible backend
//! - Configurable intake dialogue producing a track/elective recommendation

pub mod config;
pub mod db;
pub mod dialogue;
pub mod error;
pub mod index;
pub mod llm;
pub mod rag;
pub mod recommend;
pub mod search;
pub mod service;

pub use config::{AttributeSpec, Config, IntakeConfig, LLMServiceConfig};
pub use db::{
    hash_content, shared, Database, Document, DocumentKind, IndexStats, SharedDatabase, Track,
};
pub use dialogue::{ConversationState, ConversationStore, IntakeMachine, IntakeStep, Stage};
pub use error::{AdmitaError, Error, Result};
pub use index::{Chunk, Chunker, Indexer};
pub use llm::{ChatMessage, ChatModel, Embedder, HttpClient, RetryPolicy};
pub use rag::AnswerComposer;
pub use recommend::{ApplicantProfile, Elective, Recommendation, Recommender};
pub use search::{RetrievalResult, Retriever, ScoredChunk};
pub use service::AdvisorService;

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "admita";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "admita";
